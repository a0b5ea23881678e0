/// A request to the `SnapshotService`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotRecv {
    /// Writes the snapshot immediately, cancelling the pending autosave.
    Flush,
}

/// Acknowledges a `SnapshotRecv::Flush`, after the write completed (or failed)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotFlushed;
