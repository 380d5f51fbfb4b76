//! Common test utilities: in-memory block device and a fake platform

#![allow(dead_code)]

pub mod builder;
pub use builder::{disk_pattern, GptBuilder, DISK_BLOCK_SIZE};

use gpt_disk_io::BlockIo;
use gpt_disk_types::{BlockSize, Lba};
use morpheus_reader::error::status;
use morpheus_reader::memory::{MemoryDescriptor, MemoryType, PhysicalRange};
use morpheus_reader::sparse::{ChunkHeader, ChunkType, SparseHeader, CHUNK_HEADER_SIZE, SPARSE_HEADER_SIZE};
use morpheus_reader::{
    DiskServices, GptDisk, MemoryServices, PartitionExtent, Platform, Reader, ReaderError,
    Result, Session, TableServices, VariableServices,
};
use std::io;
use uguid::Guid;

pub const PAGE: u64 = 0x1000;

/// In-memory block device for testing
#[derive(Debug, Clone)]
pub struct MemoryBlockDevice {
    pub data: Vec<u8>,
    pub block_size: usize,
    /// Fail every read once set
    pub broken: bool,
}

impl MemoryBlockDevice {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            block_size: DISK_BLOCK_SIZE,
            broken: false,
        }
    }
}

impl BlockIo for MemoryBlockDevice {
    type Error = io::Error;

    fn block_size(&self) -> BlockSize {
        BlockSize::new(self.block_size as u32).expect("valid block size")
    }

    fn num_blocks(&mut self) -> std::result::Result<u64, Self::Error> {
        Ok((self.data.len() / self.block_size) as u64)
    }

    fn read_blocks(&mut self, start_lba: Lba, dst: &mut [u8]) -> std::result::Result<(), Self::Error> {
        if self.broken {
            return Err(io::Error::new(io::ErrorKind::Other, "device failure"));
        }
        let offset = start_lba.0 as usize * self.block_size;
        if offset + dst.len() > self.data.len() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "read beyond end of device",
            ));
        }
        dst.copy_from_slice(&self.data[offset..offset + dst.len()]);
        Ok(())
    }

    fn write_blocks(&mut self, start_lba: Lba, src: &[u8]) -> std::result::Result<(), Self::Error> {
        let offset = start_lba.0 as usize * self.block_size;
        if offset + src.len() > self.data.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                "write beyond end of device",
            ));
        }
        self.data[offset..offset + src.len()].copy_from_slice(src);
        Ok(())
    }

    fn flush(&mut self) -> std::result::Result<(), Self::Error> {
        Ok(())
    }
}

/// Firmware stand-in: physical address N is `ram[N]`.
pub struct MockPlatform {
    pub memory_map: Vec<MemoryDescriptor>,
    pub ram: Vec<u8>,
    pub disk: GptDisk<MemoryBlockDevice>,
    pub tables: Vec<(&'static str, PhysicalRange)>,
    pub variables: Vec<(&'static str, Guid, Vec<u8>)>,
}

/// Byte stored at physical address `address` by [`MockPlatform::with_memory`].
pub fn ram_pattern(address: usize) -> u8 {
    (address.wrapping_mul(7) % 253) as u8
}

impl MockPlatform {
    /// Platform with an empty memory map and the standard test disk.
    pub fn new() -> Self {
        Self {
            memory_map: Vec::new(),
            ram: Vec::new(),
            disk: GptDisk::new(standard_disk()),
            tables: Vec::new(),
            variables: Vec::new(),
        }
    }

    /// Install `regions` as the memory map, backed by patterned RAM.
    pub fn with_memory(mut self, regions: &[(MemoryType, u64, u64)]) -> Self {
        self.memory_map = regions
            .iter()
            .map(|&(kind, start, pages)| MemoryDescriptor::new(kind, start, pages))
            .collect();

        let top = self.memory_map.iter().map(|d| d.end()).max().unwrap_or(0) as usize;
        self.ram = (0..top).map(ram_pattern).collect();
        self
    }

    /// Place `bytes` at `address` and register them under `signature`.
    pub fn with_table(mut self, signature: &'static str, address: u64, bytes: &[u8]) -> Self {
        let end = address as usize + bytes.len();
        if self.ram.len() < end {
            self.ram.resize(end, 0);
        }
        self.ram[address as usize..end].copy_from_slice(bytes);
        self.tables
            .push((signature, PhysicalRange::new(address, bytes.len() as u64)));
        self
    }

    pub fn with_variable(mut self, name: &'static str, vendor: Guid, data: &[u8]) -> Self {
        self.variables.push((name, vendor, data.to_vec()));
        self
    }
}

impl MemoryServices for MockPlatform {
    fn memory_map(&mut self, map: &mut [MemoryDescriptor]) -> Result<usize> {
        if self.memory_map.len() > map.len() {
            return Err(ReaderError::from_efi_status(status::EFI_BUFFER_TOO_SMALL)
                .unwrap_or(ReaderError::IoError));
        }
        map[..self.memory_map.len()].copy_from_slice(&self.memory_map);
        Ok(self.memory_map.len())
    }

    fn physical_view(&self, range: PhysicalRange) -> Result<&[u8]> {
        let start = range.address as usize;
        let end = range.end().ok_or(ReaderError::IoError)? as usize;
        self.ram.get(start..end).ok_or(ReaderError::IoError)
    }
}

impl DiskServices for MockPlatform {
    fn lookup_partition(&mut self, label: &str) -> Result<PartitionExtent> {
        self.disk.lookup_partition(label)
    }

    fn read_disk(&mut self, offset: u64, buffer: &mut [u8]) -> Result<()> {
        self.disk.read_disk(offset, buffer)
    }
}

impl TableServices for MockPlatform {
    fn lookup_table(&mut self, signature: &str) -> Result<PhysicalRange> {
        self.tables
            .iter()
            .find(|(sig, _)| *sig == signature)
            .map(|(_, range)| *range)
            .ok_or(ReaderError::NotFound)
    }
}

impl VariableServices for MockPlatform {
    fn next_variable_name(&mut self, name: &mut String, vendor: &mut Guid) -> Result<bool> {
        let next = if name.is_empty() {
            0
        } else {
            self.variables
                .iter()
                .position(|(n, g, _)| *n == name.as_str() && g == vendor)
                .map(|index| index + 1)
                .ok_or(ReaderError::InvalidArgument)?
        };

        match self.variables.get(next) {
            Some((n, g, _)) => {
                name.clear();
                name.push_str(n);
                *vendor = *g;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn read_variable(&mut self, name: &str, vendor: &Guid) -> Result<Vec<u8>> {
        self.variables
            .iter()
            .find(|(n, g, _)| *n == name && g == vendor)
            .map(|(_, _, data)| data.clone())
            .ok_or(ReaderError::NotFound)
    }
}

/// 128-block disk: "boot" on LBAs 40..=47, "data" on LBAs 48..=79.
pub fn standard_disk() -> MemoryBlockDevice {
    GptBuilder::new(128)
        .partition("boot", 40, 47)
        .partition("data", 48, 79)
        .build()
}

/// Read `session` to the end in reads of at most `chunk` bytes.
pub fn drain<'a, P: Platform>(
    reader: &mut Reader<'a, P>,
    session: &mut Session<'a>,
    chunk: usize,
) -> Vec<u8> {
    let mut out = Vec::new();
    loop {
        let data = reader.read(session, chunk).expect("read");
        if data.is_empty() {
            break;
        }
        assert!(data.len() <= chunk);
        out.extend_from_slice(data);
    }
    assert!(session.is_finished());
    out
}

/// One decoded chunk of a sparse stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedChunk {
    pub header: ChunkHeader,
    pub payload: Vec<u8>,
}

/// Split a sparse stream into its file header and chunks.
pub fn decode_sparse(stream: &[u8]) -> (SparseHeader, Vec<DecodedChunk>) {
    let header = SparseHeader::parse(stream).expect("sparse header");
    let mut chunks = Vec::new();
    let mut offset = SPARSE_HEADER_SIZE;

    for _ in 0..header.total_chunks {
        let chunk = ChunkHeader::parse(&stream[offset..]).expect("chunk header");
        offset += CHUNK_HEADER_SIZE;

        let payload_len = chunk.payload_bytes() as usize;
        let payload = stream[offset..offset + payload_len].to_vec();
        offset += payload_len;

        if chunk.chunk_type == ChunkType::Raw {
            assert_eq!(payload_len as u64, chunk.covered_bytes());
        }
        chunks.push(DecodedChunk {
            header: chunk,
            payload,
        });
    }

    assert_eq!(offset, stream.len(), "trailing bytes after last chunk");
    (header, chunks)
}

/// `(type, blocks)` pairs of a decoded stream
pub fn chunk_kinds(chunks: &[DecodedChunk]) -> Vec<(ChunkType, u32)> {
    chunks
        .iter()
        .map(|c| (c.header.chunk_type, c.header.chunk_sz))
        .collect()
}
