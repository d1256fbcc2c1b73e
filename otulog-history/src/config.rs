//! Configuration for the history engine.

/// Configuration for the history engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Deltas whose JSON serialization exceeds this many bytes are written
    /// to the diff blob store instead of inline into the change record.
    pub diff_offload_threshold: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            diff_offload_threshold: 1024 * 1024, // 1 MiB
        }
    }
}
