//! Two `Source` implementations shipped with the binary itself rather than
//! with `core-source`: `StdinSource` streams whatever arrives on standard
//! input, and `DemoSource` generates a synthetic mix of JSON and
//! plain-text lines for smoke-testing the viewer without a live backend.
//! Concrete adapters for a real backend (Kubernetes, a container runtime)
//! are out of scope; these two exist only to make the binary runnable.
//!
//! Grounded on `examples/original_source/internal/source/stdin/source.go`
//! (the stdin adapter's `bufio.Scanner` loop) and
//! `internal/source/fake/source.go` (the synthetic line generator).

use async_trait::async_trait;
use core_source::{Column, Item, ItemKind, Source, SourceError};
use core_state::AppState;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
pub struct StdinSource;

impl StdinSource {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Source for StdinSource {
    async fn init(&self, state_tx: mpsc::Sender<AppState>) -> Result<(), SourceError> {
        state_tx
            .send(AppState::Browse)
            .await
            .map_err(|e| SourceError::Init(e.to_string()))
    }

    fn columns(&self) -> Vec<Column> {
        vec![Column::new(
            "stdin",
            vec![Item::leaf("stdin", "stdin", ItemKind::RawLine)],
        )]
    }

    async fn logs(
        &self,
        cancel: CancellationToken,
        state_tx: mpsc::Sender<AppState>,
        log_tx: mpsc::Sender<String>,
    ) -> Result<(), SourceError> {
        state_tx
            .send(AppState::Logs)
            .await
            .map_err(|e| SourceError::Stream(e.to_string()))?;

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                next = lines.next_line() => {
                    match next {
                        Ok(Some(line)) => {
                            if log_tx.send(line).await.is_err() {
                                return Ok(());
                            }
                        }
                        Ok(None) => return Ok(()),
                        Err(e) => return Err(SourceError::Stream(e.to_string())),
                    }
                }
            }
        }
    }
}

#[derive(Default)]
pub struct DemoSource;

impl DemoSource {
    pub fn new() -> Self {
        Self
    }
}

/// A short fixed prelude mirroring `fake/source.go`'s mix of one JSON line
/// and a handful of Apache-combined-log-format plain-text lines, so the
/// demo exercises both the JSON-projection path and the raw-text path.
const DEMO_PRELUDE: &[&str] = &[
    r#"{"level":"info","msg":"tailview demo source starting","pid":4242}"#,
    r#"127.0.0.1 - - "GET /healthz HTTP/1.1" 200 14"#,
    r#"127.0.0.1 - - "GET /favicon.ico HTTP/1.1" 404 0"#,
    r#"{"level":"warn","msg":"slow request","duration_ms":420,"route":"/api/search"}"#,
    r#"{"level":"error","msg":"upstream timeout","req_id":"a1b2c3"}"#,
];

#[async_trait]
impl Source for DemoSource {
    async fn init(&self, state_tx: mpsc::Sender<AppState>) -> Result<(), SourceError> {
        state_tx
            .send(AppState::Browse)
            .await
            .map_err(|e| SourceError::Init(e.to_string()))
    }

    fn columns(&self) -> Vec<Column> {
        vec![Column::new(
            "demo",
            vec![Item::leaf("synthetic", "synthetic", ItemKind::RawLine)],
        )]
    }

    async fn logs(
        &self,
        cancel: CancellationToken,
        state_tx: mpsc::Sender<AppState>,
        log_tx: mpsc::Sender<String>,
    ) -> Result<(), SourceError> {
        state_tx
            .send(AppState::Logs)
            .await
            .map_err(|e| SourceError::Stream(e.to_string()))?;

        let mut tick: u64 = 0;
        loop {
            if cancel.is_cancelled() {
                return Ok(());
            }
            let line = match DEMO_PRELUDE.get(tick as usize) {
                Some(prelude) => prelude.to_string(),
                None => format!(
                    r#"{{"level":"info","msg":"tick","n":{tick},"uptime_ms":{}}}"#,
                    tick * 200
                ),
            };
            if log_tx.send(line).await.is_err() {
                return Ok(());
            }
            tick += 1;

            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                _ = tokio::time::sleep(std::time::Duration::from_millis(200)) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stdin_source_reports_browse_on_init() {
        let src = StdinSource::new();
        let (tx, mut rx) = mpsc::channel(4);
        src.init(tx).await.unwrap();
        assert_eq!(rx.recv().await, Some(AppState::Browse));
    }

    #[tokio::test]
    async fn demo_source_streams_its_prelude_then_keeps_going() {
        let src = DemoSource::new();
        let (state_tx, mut state_rx) = mpsc::channel(4);
        let (log_tx, mut log_rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();
        let stream_cancel = cancel.clone();

        let handle = tokio::spawn(async move { src.logs(stream_cancel, state_tx, log_tx).await });

        assert_eq!(state_rx.recv().await, Some(AppState::Logs));
        let first = log_rx.recv().await.unwrap();
        assert!(first.contains("tailview demo source starting"));

        cancel.cancel();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn cancellation_before_any_line_stops_quietly() {
        let src = DemoSource::new();
        let (state_tx, _state_rx) = mpsc::channel(4);
        let (log_tx, _log_rx) = mpsc::channel(4);
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(src.logs(cancel, state_tx, log_tx).await.is_ok());
    }
}
