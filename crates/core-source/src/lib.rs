//! The `Source` capability contract: how an external log producer tells the
//! engine it's ready, what it's browsable hierarchy looks like, and how it
//! streams lines (spec.md §4.7/§6). Concrete adapters (Kubernetes, a
//! container runtime, stdin) are out of scope here — this crate only defines
//! the interface they implement.
//!
//! Grounded on `examples/original_source/internal/source/source.go` (the
//! `Source` interface), `internal/source/list.go` (`ListItem`'s
//! `String`/`Children`/`FilterValue` capability), and the `k8s`/`docker`
//! adapters' concrete item shapes (`internal/source/k8s/container.go`,
//! `internal/source/docker/container.go`) for the `ItemKind` variants.

use async_trait::async_trait;
use core_state::AppState;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source failed to initialize: {0}")]
    Init(String),
    #[error("log stream failed: {0}")]
    Stream(String),
}

/// What kind of browsable resource an [`Item`] stands for. A tagged variant
/// rather than a trait-object hierarchy, per spec.md §9's design note — the
/// kinds a real Kubernetes/container-runtime adapter would need, even though
/// no concrete adapter ships in this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Namespace,
    Workload,
    Pod,
    Container,
    RuntimeContainer,
    RawLine,
}

/// One entry in a browsable selector column. `filter_value` is what a
/// fuzzy-filter over the column would match against; `children` holds the
/// next column's items scoped to this selection (e.g. a namespace's
/// workloads), empty for a leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub label: String,
    pub filter_value: String,
    pub kind: ItemKind,
    children: Vec<Item>,
}

impl Item {
    pub fn new(
        label: impl Into<String>,
        filter_value: impl Into<String>,
        kind: ItemKind,
        children: Vec<Item>,
    ) -> Self {
        Self {
            label: label.into(),
            filter_value: filter_value.into(),
            kind,
            children,
        }
    }

    /// A leaf item with no children, e.g. a single container.
    pub fn leaf(label: impl Into<String>, filter_value: impl Into<String>, kind: ItemKind) -> Self {
        Self::new(label, filter_value, kind, Vec::new())
    }

    pub fn children(&self) -> &[Item] {
        &self.children
    }
}

/// One browsable column (e.g. "Namespaces", "Pods"). The leaf column's
/// selected item identifies a log stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub title: String,
    pub items: Vec<Item>,
}

impl Column {
    pub fn new(title: impl Into<String>, items: Vec<Item>) -> Self {
        Self {
            title: title.into(),
            items,
        }
    }
}

/// An external producer of log lines, paired with a browsable selector
/// hierarchy (spec.md §4.7).
///
/// `logs`'s `cancel` token is the idiomatic async-Rust equivalent of the Go
/// original's `context.Context` (`internal/source/source.go`'s
/// `Logs(ctx context.Context, ...)`); the caller cancels it on a
/// `Logs → Browse` transition or application shutdown, and a well-behaved
/// implementation must observe it promptly and drain quietly (§5).
#[async_trait]
pub trait Source: Send + Sync {
    /// Enumerate resources and publish `Loading` then `Browse` on
    /// `state_tx` once ready. May return an error that terminates the app.
    async fn init(&self, state_tx: mpsc::Sender<AppState>) -> Result<(), SourceError>;

    /// Ordered selector columns; the last column's items identify a log
    /// stream.
    fn columns(&self) -> Vec<Column>;

    /// Begin streaming. Publishes `Logs` on `state_tx` once streaming
    /// starts (or immediately, for sources that need no setup), then writes
    /// each line to `log_tx` until `cancel` fires or the stream reaches EOF.
    async fn logs(
        &self,
        cancel: CancellationToken,
        state_tx: mpsc::Sender<AppState>,
        log_tx: mpsc::Sender<String>,
    ) -> Result<(), SourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_item_has_no_children() {
        let item = Item::leaf("nginx", "nginx", ItemKind::Container);
        assert!(item.children().is_empty());
    }

    #[test]
    fn parent_item_carries_its_children() {
        let pod = Item::new(
            "web-1",
            "web-1",
            ItemKind::Pod,
            vec![Item::leaf("nginx", "nginx", ItemKind::Container)],
        );
        assert_eq!(pod.children().len(), 1);
        assert_eq!(pod.children()[0].label, "nginx");
    }

    struct NoopSource;

    #[async_trait]
    impl Source for NoopSource {
        async fn init(&self, state_tx: mpsc::Sender<AppState>) -> Result<(), SourceError> {
            state_tx
                .send(AppState::Loading)
                .await
                .map_err(|e| SourceError::Init(e.to_string()))?;
            state_tx
                .send(AppState::Browse)
                .await
                .map_err(|e| SourceError::Init(e.to_string()))
        }

        fn columns(&self) -> Vec<Column> {
            vec![Column::new(
                "Containers",
                vec![Item::leaf("nginx", "nginx", ItemKind::Container)],
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
            for i in 0..3 {
                if cancel.is_cancelled() {
                    return Ok(());
                }
                log_tx
                    .send(format!("line {i}"))
                    .await
                    .map_err(|e| SourceError::Stream(e.to_string()))?;
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn a_source_can_init_and_stream() {
        let src = NoopSource;
        let (state_tx, mut state_rx) = mpsc::channel(4);
        src.init(state_tx.clone()).await.unwrap();
        assert_eq!(state_rx.recv().await, Some(AppState::Loading));
        assert_eq!(state_rx.recv().await, Some(AppState::Browse));

        assert_eq!(src.columns().len(), 1);

        let (log_tx, mut log_rx) = mpsc::channel(4);
        let cancel = CancellationToken::new();
        src.logs(cancel, state_tx, log_tx).await.unwrap();
        assert_eq!(state_rx.recv().await, Some(AppState::Logs));
        assert_eq!(log_rx.recv().await, Some("line 0".to_string()));
    }

    #[tokio::test]
    async fn cancellation_stops_the_stream_quietly() {
        let src = NoopSource;
        let (state_tx, _state_rx) = mpsc::channel(4);
        let (log_tx, _log_rx) = mpsc::channel(4);
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(src.logs(cancel, state_tx, log_tx).await.is_ok());
    }
}
