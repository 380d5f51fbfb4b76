//! Memory map to sparse chunk conversion
//!
//! Walks a sorted memory map and describes the capture window as a gap-free,
//! overlap-free run of chunks: conventional memory becomes RAW, everything
//! else (other region types and holes between regions) becomes DONT_CARE.
//!
//! ```text
//!  map:     [ Reserved ][ Conventional ]      [ Conventional ]
//!  window:        |<-------------------------------->|
//!  chunks:        [DC  ][ RAW          ][ DC ][ RAW  ]
//! ```
//!
//! Nothing here allocates: the chunk list is a fixed array that lives in the
//! caller's arena.

use crate::config::{MAX_CHUNKS, PAGE_SIZE};
use crate::error::{ReaderError, Result};
use crate::memory::{is_page_aligned, MemoryDescriptor};
use crate::sparse::{ChunkHeader, ChunkType, SparseHeader, CHUNK_HEADER_SIZE, SPARSE_HEADER_SIZE};
use crate::{log_debug, log_error};

/// Largest range one chunk can cover: a RAW chunk's total size (header plus
/// payload) has to fit the 32-bit `total_sz` field.
pub const MAX_CHUNK_BYTES: u64 =
    (u32::MAX as u64 - CHUNK_HEADER_SIZE as u64) / PAGE_SIZE * PAGE_SIZE;

/// Requested capture boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureWindow {
    pub start: u64,
    /// Exclusive end; `None` runs to the end of the last region
    pub end: Option<u64>,
}

impl CaptureWindow {
    pub fn new(start: u64, end: Option<u64>) -> Result<Self> {
        let end_aligned = end.map_or(true, is_page_aligned);
        if !is_page_aligned(start) || !end_aligned {
            log_error!("boundaries must be multiples of the page size", PAGE_SIZE);
            return Err(ReaderError::InvalidArgument);
        }

        if let Some(end) = end {
            if end <= start {
                log_error!("end boundary precedes start boundary", end);
                return Err(ReaderError::InvalidArgument);
            }
        }

        Ok(Self { start, end })
    }

    /// Whole address space from zero.
    pub const fn full() -> Self {
        Self {
            start: 0,
            end: None,
        }
    }

    /// Bytes of `[from, to)` falling inside the window.
    fn clip(&self, from: u64, to: u64) -> u64 {
        let lo = from.max(self.start);
        let hi = match self.end {
            Some(end) => to.min(end),
            None => to,
        };
        hi.saturating_sub(lo)
    }

    fn ends_at_or_before(&self, address: u64) -> bool {
        matches!(self.end, Some(end) if end <= address)
    }
}

/// Fixed-capacity chunk list with running totals.
pub struct ChunkList {
    entries: [ChunkHeader; MAX_CHUNKS],
    len: usize,
    total_blocks: u64,
    encoded_len: u64,
}

impl ChunkList {
    pub const fn new() -> Self {
        Self {
            entries: [ChunkHeader::EMPTY; MAX_CHUNKS],
            len: 0,
            total_blocks: 0,
            encoded_len: 0,
        }
    }

    pub fn clear(&mut self) {
        self.len = 0;
        self.total_blocks = 0;
        self.encoded_len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, index: usize) -> Option<&ChunkHeader> {
        self.as_slice().get(index)
    }

    pub fn as_slice(&self) -> &[ChunkHeader] {
        &self.entries[..self.len]
    }

    /// Blocks covered by every chunk so far
    pub fn total_blocks(&self) -> u64 {
        self.total_blocks
    }

    /// Chunk headers plus RAW payloads, in bytes
    pub fn encoded_len(&self) -> u64 {
        self.encoded_len
    }

    /// Describe `bytes` of address space as chunks of `chunk_type`.
    ///
    /// Zero-length ranges add nothing. Ranges larger than
    /// [`MAX_CHUNK_BYTES`] are split across consecutive chunks.
    pub fn push(&mut self, chunk_type: ChunkType, bytes: u64) -> Result<()> {
        if !is_page_aligned(bytes) {
            log_error!("chunk size must be a multiple of the page size", bytes);
            return Err(ReaderError::InvalidArgument);
        }

        let mut remaining = bytes;
        while remaining > 0 {
            if self.len == MAX_CHUNKS {
                log_error!("chunk list full, max", MAX_CHUNKS);
                return Err(ReaderError::OutOfResources);
            }

            let piece = remaining.min(MAX_CHUNK_BYTES);
            let payload = match chunk_type {
                ChunkType::Raw => piece,
                _ => 0,
            };

            // piece <= MAX_CHUNK_BYTES, so both fit in u32
            let chunk = ChunkHeader {
                chunk_type,
                reserved: 0,
                chunk_sz: (piece / PAGE_SIZE) as u32,
                total_sz: (CHUNK_HEADER_SIZE as u64 + payload) as u32,
            };

            self.entries[self.len] = chunk;
            self.len += 1;
            self.total_blocks += chunk.chunk_sz as u64;
            self.encoded_len += chunk.total_sz as u64;
            remaining -= piece;
        }

        Ok(())
    }
}

impl Default for ChunkList {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a successful walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SparseLayout {
    /// First captured address
    pub start: u64,
    /// Exclusive end of the capture, resolved when the window was open-ended
    pub end: u64,
    /// Finalized file header
    pub header: SparseHeader,
    /// Bytes the whole image occupies on the wire
    pub stream_len: u64,
}

/// Describe `window` of the memory map `regions` as sparse chunks.
///
/// `regions` must already be sorted by physical start.
pub fn build_chunks(
    regions: &[MemoryDescriptor],
    window: CaptureWindow,
    chunks: &mut ChunkList,
) -> Result<SparseLayout> {
    chunks.clear();

    let mut prev_end = 0u64;
    let mut reached_end = false;

    for region in regions {
        let region_start = region.physical_start;
        let region_end = region.end();

        // prev_end never moves backwards, or a nested region hides an overlap
        if window.start >= region_end {
            prev_end = prev_end.max(region_end);
            continue;
        }

        // Hole between two memory regions
        if prev_end != region_start {
            if prev_end > region_start {
                log_error!("overlap detected at", region_start);
                return Err(ReaderError::InvalidArgument);
            }

            chunks.push(ChunkType::DontCare, window.clip(prev_end, region_start))?;

            if window.ends_at_or_before(region_start) {
                reached_end = true;
                break;
            }
        }

        let chunk_type = if region.memory_type.is_captured() {
            ChunkType::Raw
        } else {
            ChunkType::DontCare
        };
        chunks.push(chunk_type, window.clip(region_start, region_end))?;

        prev_end = region_end;
        if window.ends_at_or_before(region_end) {
            reached_end = true;
            break;
        }
    }

    if window.end.is_some() && !reached_end {
        log_error!("end boundary is in unreachable memory region, map ends at", prev_end);
        return Err(ReaderError::InvalidArgument);
    }

    if chunks.is_empty() {
        log_error!("start boundary is in unreachable memory region", window.start);
        return Err(ReaderError::InvalidArgument);
    }

    let end = window.end.unwrap_or(prev_end);

    let total_blks = u32::try_from(chunks.total_blocks()).map_err(|_| {
        log_error!("capture window exceeds sparse block count", chunks.total_blocks());
        ReaderError::InvalidArgument
    })?;

    let mut header = SparseHeader::new();
    header.total_blks = total_blks;
    header.total_chunks = chunks.len() as u32;

    log_debug!("sparse chunks built", chunks.len());

    Ok(SparseLayout {
        start: window.start,
        end,
        header,
        stream_len: SPARSE_HEADER_SIZE as u64 + chunks.encoded_len(),
    })
}
