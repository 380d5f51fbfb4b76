// GPT-backed disk services using gpt-disk-rs

use gpt_disk_io::{BlockIo, Disk};
use gpt_disk_types::{BlockSize, Lba};

use crate::error::{ReaderError, Result};
use crate::firmware::{DiskServices, PartitionExtent};
use crate::{log_debug, log_error};

/// Largest logical block size the bounce buffers handle.
pub const MAX_BLOCK_SIZE: usize = 4096;

/// UTF-16 code units in a GPT partition name.
const NAME_UNITS: usize = 36;

/// Borrowed block device, so a `Disk` can be built without giving up the owner.
pub struct BlockIoRef<'a, B: BlockIo>(pub &'a mut B);

impl<B: BlockIo> BlockIo for BlockIoRef<'_, B> {
    type Error = B::Error;

    fn block_size(&self) -> BlockSize {
        self.0.block_size()
    }

    fn num_blocks(&mut self) -> core::result::Result<u64, Self::Error> {
        self.0.num_blocks()
    }

    fn read_blocks(&mut self, start_lba: Lba, dst: &mut [u8]) -> core::result::Result<(), Self::Error> {
        self.0.read_blocks(start_lba, dst)
    }

    fn write_blocks(&mut self, start_lba: Lba, src: &[u8]) -> core::result::Result<(), Self::Error> {
        self.0.write_blocks(start_lba, src)
    }

    fn flush(&mut self) -> core::result::Result<(), Self::Error> {
        self.0.flush()
    }
}

/// A block device with a GPT, addressed by partition label and byte offset.
pub struct GptDisk<B: BlockIo> {
    io: B,
}

impl<B: BlockIo> GptDisk<B> {
    pub fn new(io: B) -> Self {
        Self { io }
    }

    pub fn block_io(&self) -> &B {
        &self.io
    }

    pub fn into_inner(self) -> B {
        self.io
    }

    fn block_size(&self) -> Result<usize> {
        let size = self.io.block_size().to_u32() as usize;
        if size == 0 || size > MAX_BLOCK_SIZE {
            log_error!("unsupported logical block size", size);
            return Err(ReaderError::Unsupported);
        }
        Ok(size)
    }

    /// Find the partition whose name equals `label`.
    pub fn find_partition(&mut self, label: &str) -> Result<PartitionExtent> {
        let block_size = self.block_size()?;
        let mut header_buf = [0u8; MAX_BLOCK_SIZE];
        let mut entry_buf = [0u8; MAX_BLOCK_SIZE];

        let mut disk = Disk::new(BlockIoRef(&mut self.io)).map_err(|_| {
            log_error!("cannot open block device");
            ReaderError::IoError
        })?;

        let header = disk
            .read_primary_gpt_header(&mut header_buf[..block_size])
            .map_err(|_| {
                log_error!("failed to read primary GPT header");
                ReaderError::IoError
            })?;

        if !header.is_signature_valid() {
            log_error!("block device has no GPT signature");
            return Err(ReaderError::IoError);
        }

        let layout = header.get_partition_entry_array_layout().map_err(|_| {
            log_error!("invalid GPT partition entry layout");
            ReaderError::IoError
        })?;

        let iter = disk
            .gpt_partition_entry_array_iter(layout, &mut entry_buf[..block_size])
            .map_err(|_| {
                log_error!("failed to read GPT partition entries");
                ReaderError::IoError
            })?;

        for (index, entry_result) in iter.enumerate() {
            let entry = entry_result.map_err(|_| ReaderError::IoError)?;

            if !entry.is_used() {
                continue;
            }

            // Copy out of the packed entry
            let name = entry.name.0;
            if !label_matches(&name, label) {
                continue;
            }

            let first = entry.starting_lba.to_u64();
            let last = entry.ending_lba.to_u64();
            let extent = lba_extent(first, last, block_size as u64).ok_or_else(|| {
                log_error!("corrupt partition bounds, entry", index);
                ReaderError::IoError
            })?;

            log_debug!("partition found at entry", index);
            return Ok(extent);
        }

        log_error!("no partition with the requested label");
        Err(ReaderError::NotFound)
    }

    /// Read `buffer.len()` bytes starting at the absolute byte `offset`.
    ///
    /// Whole blocks go straight into `buffer`; an unaligned head or tail
    /// goes through a one-block bounce buffer.
    pub fn read_bytes(&mut self, offset: u64, buffer: &mut [u8]) -> Result<()> {
        let block_size = self.block_size()?;
        let mut bounce = [0u8; MAX_BLOCK_SIZE];
        let bounce = &mut bounce[..block_size];

        let mut position = offset;
        let mut done = 0;

        while done < buffer.len() {
            let lba = Lba(position / block_size as u64);
            let within = (position % block_size as u64) as usize;
            let remaining = buffer.len() - done;

            let n = if within == 0 && remaining >= block_size {
                let whole = remaining - remaining % block_size;
                self.io
                    .read_blocks(lba, &mut buffer[done..done + whole])
                    .map_err(|_| {
                        log_error!("block read failed at lba", lba.0);
                        ReaderError::IoError
                    })?;
                whole
            } else {
                self.io.read_blocks(lba, bounce).map_err(|_| {
                    log_error!("block read failed at lba", lba.0);
                    ReaderError::IoError
                })?;
                let n = (block_size - within).min(remaining);
                buffer[done..done + n].copy_from_slice(&bounce[within..within + n]);
                n
            };

            done += n;
            position += n as u64;
        }

        Ok(())
    }
}

impl<B: BlockIo> DiskServices for GptDisk<B> {
    fn lookup_partition(&mut self, label: &str) -> Result<PartitionExtent> {
        self.find_partition(label)
    }

    fn read_disk(&mut self, offset: u64, buffer: &mut [u8]) -> Result<()> {
        self.read_bytes(offset, buffer)
    }
}

/// Byte placement of the inclusive LBA range `first..=last`.
///
/// `None` when the range is inverted or does not fit 64-bit byte offsets.
fn lba_extent(first: u64, last: u64, block_size: u64) -> Option<PartitionExtent> {
    let blocks = last.checked_sub(first)?.checked_add(1)?;
    let length = blocks.checked_mul(block_size)?;
    let offset = first.checked_mul(block_size)?;
    offset.checked_add(length)?;
    Some(PartitionExtent { offset, length })
}

/// Compare a raw UTF-16LE partition name with `label`, up to the first NUL.
fn label_matches(raw: &[u8; NAME_UNITS * 2], label: &str) -> bool {
    let units = raw
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take_while(|&unit| unit != 0);

    let mut expected = label.encode_utf16();
    for unit in units {
        if expected.next() != Some(unit) {
            return false;
        }
    }
    expected.next().is_none()
}
