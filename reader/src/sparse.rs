//! Android sparse image wire format
//!
//! ```text
//! [file header: 28 bytes]
//! [chunk header: 12 bytes][payload: chunk_sz * blk_sz bytes, RAW only]
//! [chunk header: 12 bytes]
//! ...
//! ```
//!
//! All fields are little-endian.

use crate::config::PAGE_SIZE;

/// Sparse file magic
pub const SPARSE_HEADER_MAGIC: u32 = 0xED26_FF3A;

pub const SPARSE_MAJOR_VERSION: u16 = 1;
pub const SPARSE_MINOR_VERSION: u16 = 0;

/// Encoded file header size in bytes
pub const SPARSE_HEADER_SIZE: usize = 28;

/// Encoded chunk header size in bytes
pub const CHUNK_HEADER_SIZE: usize = 12;

/// Chunk types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ChunkType {
    /// Literal payload follows the header
    Raw = 0xCAC1,
    /// Four-byte fill pattern. Reserved, never produced
    Fill = 0xCAC2,
    /// Range content is irrelevant, no payload
    DontCare = 0xCAC3,
}

impl ChunkType {
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0xCAC1 => Some(ChunkType::Raw),
            0xCAC2 => Some(ChunkType::Fill),
            0xCAC3 => Some(ChunkType::DontCare),
            _ => None,
        }
    }
}

/// Sparse image file header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SparseHeader {
    pub magic: u32,
    pub major_version: u16,
    pub minor_version: u16,
    pub file_hdr_sz: u16,
    pub chunk_hdr_sz: u16,
    pub blk_sz: u32,
    pub total_blks: u32,
    pub total_chunks: u32,
    pub image_checksum: u32,
}

impl SparseHeader {
    /// Header with zero totals, ready to be finalized.
    pub const fn new() -> Self {
        Self {
            magic: SPARSE_HEADER_MAGIC,
            major_version: SPARSE_MAJOR_VERSION,
            minor_version: SPARSE_MINOR_VERSION,
            file_hdr_sz: SPARSE_HEADER_SIZE as u16,
            chunk_hdr_sz: CHUNK_HEADER_SIZE as u16,
            blk_sz: PAGE_SIZE as u32,
            total_blks: 0,
            total_chunks: 0,
            image_checksum: 0,
        }
    }

    pub fn to_bytes(&self) -> [u8; SPARSE_HEADER_SIZE] {
        let mut out = [0u8; SPARSE_HEADER_SIZE];
        out[0..4].copy_from_slice(&self.magic.to_le_bytes());
        out[4..6].copy_from_slice(&self.major_version.to_le_bytes());
        out[6..8].copy_from_slice(&self.minor_version.to_le_bytes());
        out[8..10].copy_from_slice(&self.file_hdr_sz.to_le_bytes());
        out[10..12].copy_from_slice(&self.chunk_hdr_sz.to_le_bytes());
        out[12..16].copy_from_slice(&self.blk_sz.to_le_bytes());
        out[16..20].copy_from_slice(&self.total_blks.to_le_bytes());
        out[20..24].copy_from_slice(&self.total_chunks.to_le_bytes());
        out[24..28].copy_from_slice(&self.image_checksum.to_le_bytes());
        out
    }

    /// Parse an encoded header. Returns `None` on a short buffer or bad magic.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < SPARSE_HEADER_SIZE {
            return None;
        }

        let header = Self {
            magic: read_u32(data, 0),
            major_version: read_u16(data, 4),
            minor_version: read_u16(data, 6),
            file_hdr_sz: read_u16(data, 8),
            chunk_hdr_sz: read_u16(data, 10),
            blk_sz: read_u32(data, 12),
            total_blks: read_u32(data, 16),
            total_chunks: read_u32(data, 20),
            image_checksum: read_u32(data, 24),
        };

        if header.magic != SPARSE_HEADER_MAGIC {
            return None;
        }
        Some(header)
    }
}

impl Default for SparseHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// Sparse chunk header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub chunk_type: ChunkType,
    pub reserved: u16,
    /// Covered range in blocks
    pub chunk_sz: u32,
    /// Header plus payload, in bytes
    pub total_sz: u32,
}

impl ChunkHeader {
    pub const EMPTY: Self = Self {
        chunk_type: ChunkType::DontCare,
        reserved: 0,
        chunk_sz: 0,
        total_sz: CHUNK_HEADER_SIZE as u32,
    };

    /// Bytes of address space this chunk covers.
    pub fn covered_bytes(&self) -> u64 {
        self.chunk_sz as u64 * PAGE_SIZE
    }

    /// Payload bytes following the header in the stream.
    pub fn payload_bytes(&self) -> u64 {
        self.total_sz as u64 - CHUNK_HEADER_SIZE as u64
    }

    pub fn to_bytes(&self) -> [u8; CHUNK_HEADER_SIZE] {
        let mut out = [0u8; CHUNK_HEADER_SIZE];
        out[0..2].copy_from_slice(&(self.chunk_type as u16).to_le_bytes());
        out[2..4].copy_from_slice(&self.reserved.to_le_bytes());
        out[4..8].copy_from_slice(&self.chunk_sz.to_le_bytes());
        out[8..12].copy_from_slice(&self.total_sz.to_le_bytes());
        out
    }

    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < CHUNK_HEADER_SIZE {
            return None;
        }

        Some(Self {
            chunk_type: ChunkType::from_u16(read_u16(data, 0))?,
            reserved: read_u16(data, 2),
            chunk_sz: read_u32(data, 4),
            total_sz: read_u32(data, 8),
        })
    }
}

fn read_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}
