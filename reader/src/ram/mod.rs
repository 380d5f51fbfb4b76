//! Live RAM as a sparse image
//!
//! `ram[:start[:length]]` dumps physical memory. The memory map is
//! snapshotted once at open and described as sparse chunks; the stream is
//! the file header, then each chunk header followed, for RAW chunks, by the
//! memory itself read through a zero-copy view.
//!
//! Only one RAM session can exist at a time: the arena holding the snapshot
//! is static storage and is owned by whichever session holds its capture
//! token.

pub mod arena;
pub mod encoder;

pub use arena::RamArena;
pub use encoder::{build_chunks, CaptureWindow, ChunkList, SparseLayout, MAX_CHUNK_BYTES};

pub(crate) use arena::CaptureToken;

use crate::config::MAX_MEMORY_REGIONS;
use crate::error::{ReaderError, Result};
use crate::firmware::MemoryServices;
use crate::memory::{sort_memory_map, PhysicalRange};
use crate::sparse::{ChunkType, CHUNK_HEADER_SIZE, SPARSE_HEADER_SIZE};
use crate::spec::parse_hex;
use crate::{log_debug, log_error};

/// Parse `[start [length]]`. A zero length means "to the end of memory".
pub fn parse_window(args: &[&str]) -> Result<CaptureWindow> {
    if args.len() > 2 {
        log_error!("ram takes at most 2 arguments");
        return Err(ReaderError::InvalidArgument);
    }

    let start = match args.first() {
        Some(arg) => parse_hex(arg)?,
        None => 0,
    };

    let end = match args.get(1) {
        Some(arg) => match parse_hex(arg)? {
            0 => None,
            length => Some(start.checked_add(length).ok_or_else(|| {
                log_error!("ram window overflows the address space");
                ReaderError::InvalidArgument
            })?),
        },
        None => None,
    };

    CaptureWindow::new(start, end)
}

/// Snapshot the memory map into `arena` and build its chunk list.
pub(crate) fn prepare<M: MemoryServices>(
    arena: &mut RamArena,
    args: &[&str],
    memory: &mut M,
) -> Result<SparseLayout> {
    let window = parse_window(args)?;

    let count = memory.memory_map(&mut arena.memmap).map_err(|err| {
        log_error!("failed to get the current memory map");
        err
    })?;
    if count > MAX_MEMORY_REGIONS {
        log_error!("memory map larger than snapshot buffer", count);
        return Err(ReaderError::OutOfResources);
    }

    let regions = &mut arena.memmap[..count];
    sort_memory_map(regions);

    build_chunks(regions, window, &mut arena.chunks)
}

/// Position inside the sparse stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Piece {
    FileHeader { offset: usize },
    ChunkHeader { index: usize, offset: usize },
    Payload { index: usize, end: u64 },
    Done,
}

/// Backend state of an open RAM session.
pub(crate) struct RamSource<'a> {
    token: CaptureToken<'a>,
    header: [u8; SPARSE_HEADER_SIZE],
    chunk_header: [u8; CHUNK_HEADER_SIZE],
    piece: Piece,
    /// Start of the current chunk, or the read position inside a RAW payload
    address: u64,
}

impl<'a> RamSource<'a> {
    pub(crate) fn new(token: CaptureToken<'a>, layout: &SparseLayout) -> Self {
        Self {
            token,
            header: layout.header.to_bytes(),
            chunk_header: [0; CHUNK_HEADER_SIZE],
            piece: Piece::FileHeader { offset: 0 },
            address: layout.start,
        }
    }

    /// Give the capture right back.
    pub(crate) fn into_token(self) -> CaptureToken<'a> {
        self.token
    }

    fn chunk_start(&self, index: usize) -> Piece {
        if index < self.token.arena().chunks.len() {
            Piece::ChunkHeader { index, offset: 0 }
        } else {
            Piece::Done
        }
    }

    /// Next slice of the image, at most `len` bytes and never empty.
    pub(crate) fn read<'s, M: MemoryServices>(
        &'s mut self,
        memory: &'s M,
        len: usize,
    ) -> Result<&'s [u8]> {
        match self.piece {
            Piece::FileHeader { offset } => {
                let n = len.min(SPARSE_HEADER_SIZE - offset);
                self.piece = if offset + n == SPARSE_HEADER_SIZE {
                    self.chunk_start(0)
                } else {
                    Piece::FileHeader { offset: offset + n }
                };
                Ok(&self.header[offset..offset + n])
            }

            Piece::ChunkHeader { index, offset } => {
                let chunk = *self
                    .token
                    .arena()
                    .chunks
                    .get(index)
                    .ok_or(ReaderError::InvalidArgument)?;
                if offset == 0 {
                    self.chunk_header = chunk.to_bytes();
                }

                let n = len.min(CHUNK_HEADER_SIZE - offset);
                self.piece = if offset + n < CHUNK_HEADER_SIZE {
                    Piece::ChunkHeader {
                        index,
                        offset: offset + n,
                    }
                } else {
                    let end = self.address + chunk.covered_bytes();
                    match chunk.chunk_type {
                        ChunkType::Raw => Piece::Payload { index, end },
                        _ => {
                            self.address = end;
                            self.chunk_start(index + 1)
                        }
                    }
                };
                Ok(&self.chunk_header[offset..offset + n])
            }

            Piece::Payload { index, end } => {
                let n = (len as u64).min(end - self.address);
                let view = memory.physical_view(PhysicalRange::new(self.address, n))?;
                if view.len() as u64 != n {
                    log_error!("short physical memory view at", self.address);
                    return Err(ReaderError::IoError);
                }

                self.address += n;
                if self.address == end {
                    log_debug!("raw chunk done", index);
                    self.piece = self.chunk_start(index + 1);
                }
                Ok(view)
            }

            Piece::Done => {
                log_error!("read past the end of the sparse image");
                Err(ReaderError::InvalidArgument)
            }
        }
    }
}
