//! Partition streaming through the reader, on top of a real GPT image

mod common;

use common::{disk_pattern, drain, GptBuilder, MemoryBlockDevice, MockPlatform, DISK_BLOCK_SIZE};
use morpheus_reader::{
    BlockIoRef, DiskServices, GptDisk, PartitionExtent, Reader, ReaderConfig, ReaderError, SourceKind,
};

const BOOT_START: usize = 40 * DISK_BLOCK_SIZE;
const DATA_START: usize = 48 * DISK_BLOCK_SIZE;
const DATA_LEN: usize = 32 * DISK_BLOCK_SIZE;

fn expected_disk(start: usize, len: usize) -> Vec<u8> {
    (start..start + len).map(disk_pattern).collect()
}

#[test]
fn test_gpt_lookup_by_label() {
    let mut disk = GptDisk::new(common::standard_disk());
    assert_eq!(
        disk.find_partition("boot"),
        Ok(PartitionExtent {
            offset: BOOT_START as u64,
            length: 8 * DISK_BLOCK_SIZE as u64,
        })
    );
    assert_eq!(
        disk.lookup_partition("data"),
        Ok(PartitionExtent {
            offset: DATA_START as u64,
            length: DATA_LEN as u64,
        })
    );
    assert_eq!(disk.find_partition("dat"), Err(ReaderError::NotFound));
    assert_eq!(disk.find_partition("missing"), Err(ReaderError::NotFound));
}

#[test]
fn test_gpt_unaligned_byte_reads() {
    let mut disk = GptDisk::new(common::standard_disk());
    for (offset, len) in [(DATA_START + 1, 10), (DATA_START + 511, 2), (DATA_START + 100, 1500)] {
        let mut buf = vec![0u8; len];
        disk.read_disk(offset as u64, &mut buf).unwrap();
        assert_eq!(buf, expected_disk(offset, len), "offset {offset} len {len}");
    }
}

#[test]
fn test_gpt_lookup_on_borrowed_device() {
    let mut device = common::standard_disk();
    {
        let mut disk = GptDisk::new(BlockIoRef(&mut device));
        assert_eq!(
            disk.find_partition("data").map(|extent| extent.offset),
            Ok(DATA_START as u64)
        );
    }

    // The device is still ours and still holds a readable table
    let mut disk = GptDisk::new(device);
    assert_eq!(
        disk.find_partition("boot").map(|extent| extent.length),
        Ok(8 * DISK_BLOCK_SIZE as u64)
    );
    let device = disk.into_inner();
    assert_eq!(device.data[BOOT_START], disk_pattern(BOOT_START));
}

#[test]
fn test_partition_bounds_overflow_is_io_error() {
    let device = GptBuilder::new(128)
        .partition("boot", 40, 47)
        .partition("huge", 48, u64::MAX)
        .partition("far", u64::MAX - 1, u64::MAX)
        .partition("backwards", 60, 50)
        .build();
    let mut disk = GptDisk::new(device);

    assert_eq!(disk.find_partition("huge"), Err(ReaderError::IoError));
    assert_eq!(disk.find_partition("far"), Err(ReaderError::IoError));
    assert_eq!(disk.find_partition("backwards"), Err(ReaderError::IoError));
    assert_eq!(
        disk.find_partition("boot").map(|extent| extent.offset),
        Ok(BOOT_START as u64)
    );
}

#[test]
fn test_missing_gpt_is_io_error() {
    let mut disk = GptDisk::new(MemoryBlockDevice::new(vec![0u8; 64 * DISK_BLOCK_SIZE]));
    assert_eq!(disk.find_partition("boot"), Err(ReaderError::IoError));
}

#[test]
fn test_whole_partition() {
    let mut reader = Reader::new(MockPlatform::new(), ReaderConfig::default()).unwrap();
    let mut session = reader.open("part:data").unwrap();
    assert_eq!(session.kind(), SourceKind::Partition);
    assert_eq!(session.len(), DATA_LEN as u64);

    let bytes = drain(&mut reader, &mut session, 4096);
    assert_eq!(bytes, expected_disk(DATA_START, DATA_LEN));
    reader.close(session);
}

#[test]
fn test_sub_range_any_read_size() {
    let config = ReaderConfig::default().with_partition_buffer_size(700);
    let mut reader = Reader::new(MockPlatform::new(), config).unwrap();

    for size in [1, 3, 512, 699, 700, 701, 10_000] {
        let mut session = reader.open("part:data:123:2345").unwrap();
        assert_eq!(session.len(), 0x2345);
        let bytes = drain(&mut reader, &mut session, size);
        assert_eq!(bytes, expected_disk(DATA_START + 0x123, 0x2345), "read size {size}");
        reader.close(session);
    }
}

#[test]
fn test_offset_without_length_runs_to_end() {
    let mut reader = Reader::new(MockPlatform::new(), ReaderConfig::default()).unwrap();
    let mut session = reader.open("part:boot:0x200").unwrap();
    assert_eq!(session.len(), 8 * DISK_BLOCK_SIZE as u64 - 0x200);
    let bytes = drain(&mut reader, &mut session, 333);
    assert_eq!(bytes, expected_disk(BOOT_START + 0x200, 8 * DISK_BLOCK_SIZE - 0x200));
    reader.close(session);
}

#[test]
fn test_invalid_sub_ranges() {
    let mut reader = Reader::new(MockPlatform::new(), ReaderConfig::default()).unwrap();
    for spec in [
        "part",
        "part:boot:1000",
        "part:boot:2000",
        "part:boot:0:0",
        "part:boot:800:801",
        "part:boot:0:1001",
        "part:boot:0:1:2",
        "part:boot:zz",
    ] {
        assert_eq!(reader.open(spec).err(), Some(ReaderError::InvalidArgument), "{spec}");
    }
}

#[test]
fn test_unknown_partition() {
    let mut reader = Reader::new(MockPlatform::new(), ReaderConfig::default()).unwrap();
    assert_eq!(reader.open("part:swap").err(), Some(ReaderError::NotFound));
}

#[test]
fn test_device_error_mid_stream() {
    let config = ReaderConfig::default().with_partition_buffer_size(1024);
    let mut reader = Reader::new(MockPlatform::new(), config).unwrap();
    let mut session = reader.open("part:data").unwrap();

    assert_eq!(reader.read(&mut session, 1024).unwrap().len(), 1024);
    reader.platform_mut().disk = GptDisk::new({
        let mut device = GptBuilder::new(128).partition("data", 48, 79).build();
        device.broken = true;
        device
    });
    assert_eq!(reader.read(&mut session, 1024).err(), Some(ReaderError::IoError));
    assert_eq!(session.cursor(), 1024);
    reader.close(session);
}
