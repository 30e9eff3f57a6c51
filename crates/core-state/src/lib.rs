//! Top-level application state machine: `Loading → Browse → LogsLoading →
//! Logs`, with `Logs → LoadView → Logs` for a view switch (spec.md §4.6).
//!
//! Ported from `internal/state/state.go` (the state set) and
//! `internal/logs/model.go`/`internal/model/model.go`'s `case state.State`
//! handling (the transition table) in
//! `examples/original_source/`. The Go source encodes `StateNewView` and
//! `StateLogs` as the same numeric value (`3`) — see
//! `examples/original_source/internal/state/state.go`. Per spec.md §9's open
//! question, that is treated as an accidental collision in the original, not
//! an intentional shared encoding: `AppState` below has five distinct
//! variants and `LoadView` can never compare equal to `Logs`.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Capacity of the state channel. Small and bounded, matching the teacher's
/// `core_events::EVENT_CHANNEL_CAP` policy: transitions are infrequent
/// relative to log lines, so a deep queue would only mask a stuck consumer.
pub const STATE_CHANNEL_CAPACITY: usize = 8;

pub type StateSender = mpsc::Sender<AppState>;
pub type StateReceiver = mpsc::Receiver<AppState>;

/// Construct the bounded, single-consumer state channel. Multiple source
/// tasks may hold clones of the sender half over the application's lifetime,
/// but the receiver is owned by exactly one task (the UI event loop), which
/// is what keeps transitions strictly ordered (§5).
pub fn state_channel() -> (StateSender, StateReceiver) {
    mpsc::channel(STATE_CHANNEL_CAPACITY)
}

/// One of the five states the engine can be in. `Loading` is the initial
/// state before any source has reported readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppState {
    Loading,
    Browse,
    LogsLoading,
    Logs,
    LoadView,
}

/// Drives the `AppState` transition table and owns the cancellation token
/// for whichever log stream is currently active (if any).
///
/// A token is minted the moment the machine leaves `Browse` for
/// `LogsLoading`, and cancelled the moment it returns to `Browse` from
/// `Logs` — matching spec.md §4.6's "`Logs → Browse`... cancels the active
/// log context" and §5's "leaving the Logs state triggers the token".
pub struct StateMachine {
    current: AppState,
    stream: Option<CancellationToken>,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            current: AppState::Loading,
            stream: None,
        }
    }

    pub fn current(&self) -> AppState {
        self.current
    }

    /// The cancellation token for the log stream active in `LogsLoading`/
    /// `Logs`/`LoadView`, if any. `None` outside those states.
    pub fn stream_token(&self) -> Option<CancellationToken> {
        self.stream.clone()
    }

    /// Attempt to move to `next`. Returns whether the transition was legal;
    /// an unknown/illegal transition is ignored and logged, per spec.md
    /// §4.6's "unknown transitions are ignored".
    pub fn transition(&mut self, next: AppState) -> bool {
        if !Self::is_allowed(self.current, next) {
            tracing::debug!(
                from = ?self.current,
                to = ?next,
                "ignoring illegal state transition"
            );
            return false;
        }

        match (self.current, next) {
            (AppState::Browse, AppState::LogsLoading) => {
                self.stream = Some(CancellationToken::new());
            }
            (AppState::Logs, AppState::Browse) => {
                if let Some(token) = self.stream.take() {
                    token.cancel();
                }
            }
            _ => {}
        }

        tracing::info!(from = ?self.current, to = ?next, "state transition");
        self.current = next;
        true
    }

    fn is_allowed(current: AppState, next: AppState) -> bool {
        use AppState::*;
        matches!(
            (current, next),
            (Loading, Browse)
                | (Browse, LogsLoading)
                | (LogsLoading, Logs)
                | (Logs, Browse)
                | (Logs, LoadView)
                | (LoadView, Logs)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_follows_the_spec_order() {
        let mut sm = StateMachine::new();
        assert_eq!(sm.current(), AppState::Loading);
        assert!(sm.transition(AppState::Browse));
        assert!(sm.transition(AppState::LogsLoading));
        assert!(sm.transition(AppState::Logs));
        assert_eq!(sm.current(), AppState::Logs);
    }

    #[test]
    fn view_switch_round_trips_through_load_view() {
        let mut sm = StateMachine::new();
        sm.transition(AppState::Browse);
        sm.transition(AppState::LogsLoading);
        sm.transition(AppState::Logs);
        assert!(sm.transition(AppState::LoadView));
        assert!(sm.transition(AppState::Logs));
        assert_eq!(sm.current(), AppState::Logs);
    }

    #[test]
    fn unknown_transition_is_ignored() {
        let mut sm = StateMachine::new();
        assert!(!sm.transition(AppState::Logs));
        assert_eq!(sm.current(), AppState::Loading);
        assert!(!sm.transition(AppState::LoadView));
        assert_eq!(sm.current(), AppState::Loading);
    }

    #[test]
    fn entering_logs_loading_mints_a_fresh_token() {
        let mut sm = StateMachine::new();
        sm.transition(AppState::Browse);
        assert!(sm.stream_token().is_none());
        sm.transition(AppState::LogsLoading);
        let token = sm.stream_token().expect("token minted on LogsLoading");
        assert!(!token.is_cancelled());
    }

    #[test]
    fn returning_to_browse_cancels_the_active_stream() {
        let mut sm = StateMachine::new();
        sm.transition(AppState::Browse);
        sm.transition(AppState::LogsLoading);
        sm.transition(AppState::Logs);
        let token = sm.stream_token().expect("token present in Logs");
        assert!(!token.is_cancelled());

        sm.transition(AppState::Browse);
        assert!(token.is_cancelled(), "leaving Logs must cancel the token");
        assert!(sm.stream_token().is_none());
    }

    #[test]
    fn load_view_and_logs_share_no_encoding_collision() {
        // Regression guard for the Go original's StateNewView/StateLogs value
        // collision: these must never be equal as Rust values.
        assert_ne!(AppState::LoadView, AppState::Logs);
    }
}
