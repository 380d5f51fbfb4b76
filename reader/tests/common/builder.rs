//! GPT disk image builder for tests

use super::MemoryBlockDevice;
use gpt_disk_io::Disk;
use gpt_disk_types::{
    guid, BlockSize, GptHeader, GptPartitionEntryArray, GptPartitionName, GptPartitionType,
    LbaLe, U32Le,
};
use morpheus_reader::gpt::BlockIoRef;

pub const DISK_BLOCK_SIZE: usize = 512;

/// Byte stored at absolute device offset `offset` by [`GptBuilder::build`].
pub fn disk_pattern(offset: usize) -> u8 {
    (offset % 251) as u8
}

struct PartitionSpec {
    label: &'static str,
    first_lba: u64,
    last_lba: u64,
}

/// Builds a 512-byte-block disk with a primary GPT and labelled partitions.
pub struct GptBuilder {
    num_blocks: u64,
    partitions: Vec<PartitionSpec>,
}

impl GptBuilder {
    pub fn new(num_blocks: u64) -> Self {
        Self {
            num_blocks,
            partitions: Vec::new(),
        }
    }

    /// Add a partition spanning `first_lba..=last_lba`.
    pub fn partition(mut self, label: &'static str, first_lba: u64, last_lba: u64) -> Self {
        self.partitions.push(PartitionSpec {
            label,
            first_lba,
            last_lba,
        });
        self
    }

    /// Lay the GPT down and fill every partition with [`disk_pattern`].
    pub fn build(self) -> MemoryBlockDevice {
        let mut device =
            MemoryBlockDevice::new(vec![0u8; self.num_blocks as usize * DISK_BLOCK_SIZE]);

        // Entries pointing past the device only exist in the table
        for part in self.partitions.iter().filter(|p| p.last_lba < self.num_blocks) {
            let start = part.first_lba as usize * DISK_BLOCK_SIZE;
            let end = (part.last_lba as usize + 1) * DISK_BLOCK_SIZE;
            for offset in start..end {
                device.data[offset] = disk_pattern(offset);
            }
        }

        {
            let mut disk = Disk::new(BlockIoRef(&mut device)).expect("open disk");

            let mut header = GptHeader {
                my_lba: LbaLe::from_u64(1),
                alternate_lba: LbaLe::from_u64(self.num_blocks - 1),
                first_usable_lba: LbaLe::from_u64(34),
                last_usable_lba: LbaLe::from_u64(self.num_blocks - 34),
                disk_guid: guid!("12345678-1234-1234-1234-123456789012"),
                partition_entry_lba: LbaLe::from_u64(2),
                number_of_partition_entries: U32Le::from_u32(128),
                ..Default::default()
            };

            disk.write_protective_mbr(&mut [0u8; DISK_BLOCK_SIZE])
                .expect("write protective MBR");

            let layout = header
                .get_partition_entry_array_layout()
                .expect("entry array layout");

            let mut entry_buf = vec![0u8; 128 * 128];
            let mut entries = GptPartitionEntryArray::new(layout, BlockSize::BS_512, &mut entry_buf)
                .expect("entry array");

            for (index, part) in self.partitions.iter().enumerate() {
                let entry = entries
                    .get_partition_entry_mut(index.try_into().unwrap())
                    .expect("entry slot");

                let mut name = [0u8; 72];
                for (i, unit) in part.label.encode_utf16().enumerate() {
                    name[i * 2..i * 2 + 2].copy_from_slice(&unit.to_le_bytes());
                }

                entry.partition_type_guid = GptPartitionType::BASIC_DATA;
                entry.unique_partition_guid = guid!("12345678-1234-5678-1234-567812345678");
                entry.starting_lba = LbaLe::from_u64(part.first_lba);
                entry.ending_lba = LbaLe::from_u64(part.last_lba);
                entry.name = GptPartitionName(name);
            }

            header.partition_entry_array_crc32 = entries.calculate_crc32();
            header.update_header_crc32();

            disk.write_primary_gpt_header(&header, &mut [0u8; DISK_BLOCK_SIZE])
                .expect("write GPT header");
            disk.write_gpt_partition_entry_array(&entries)
                .expect("write entry array");
            disk.flush().expect("flush");
        }

        device
    }
}
