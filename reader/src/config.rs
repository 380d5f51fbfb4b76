//! Capacities and runtime configuration

/// Platform page size; also the sparse image block size.
pub const PAGE_SIZE: u64 = 4096;

/// Maximum tokens in a spec string (backend name + arguments).
pub const MAX_SPEC_TOKENS: usize = 8;

/// Memory map descriptors the RAM arena can snapshot.
pub const MAX_MEMORY_REGIONS: usize = 256;

/// Sparse chunks the RAM arena can describe.
pub const MAX_CHUNKS: usize = 256;

/// Default partition streaming buffer (10 MiB).
pub const PARTITION_BUFFER_SIZE: usize = 10 * 1024 * 1024;

/// Reader configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Capacity of the re-fillable partition buffer, in bytes
    pub partition_buffer_size: usize,
}

impl ReaderConfig {
    /// Set the partition buffer capacity.
    pub const fn with_partition_buffer_size(mut self, size: usize) -> Self {
        self.partition_buffer_size = size;
        self
    }
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            partition_buffer_size: PARTITION_BUFFER_SIZE,
        }
    }
}
