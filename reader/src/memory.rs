//! Physical memory map types
//!
//! Mirrors the UEFI memory descriptor closely enough that a firmware
//! collaborator can copy `GetMemoryMap` output straight into it.

use crate::config::PAGE_SIZE;

/// Memory type, as reported by the firmware memory map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum MemoryType {
    /// Reserved by firmware
    Reserved = 0,
    LoaderCode = 1,
    LoaderData = 2,
    BootServicesCode = 3,
    BootServicesData = 4,
    RuntimeServicesCode = 5,
    RuntimeServicesData = 6,
    /// General-purpose RAM; the only type captured with its contents
    Conventional = 7,
    Unusable = 8,
    AcpiReclaim = 9,
    AcpiNvs = 10,
    Mmio = 11,
    MmioPortSpace = 12,
    PalCode = 13,
    /// Persistent memory (NVDIMM)
    Persistent = 14,
}

impl MemoryType {
    /// Convert from raw UEFI memory type value.
    pub fn from_uefi_raw(value: u32) -> Self {
        match value {
            1 => MemoryType::LoaderCode,
            2 => MemoryType::LoaderData,
            3 => MemoryType::BootServicesCode,
            4 => MemoryType::BootServicesData,
            5 => MemoryType::RuntimeServicesCode,
            6 => MemoryType::RuntimeServicesData,
            7 => MemoryType::Conventional,
            8 => MemoryType::Unusable,
            9 => MemoryType::AcpiReclaim,
            10 => MemoryType::AcpiNvs,
            11 => MemoryType::Mmio,
            12 => MemoryType::MmioPortSpace,
            13 => MemoryType::PalCode,
            14 => MemoryType::Persistent,
            _ => MemoryType::Reserved,
        }
    }

    /// Is the content of this region dumped as literal bytes?
    pub fn is_captured(&self) -> bool {
        matches!(self, MemoryType::Conventional)
    }
}

/// One memory map entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryDescriptor {
    pub memory_type: MemoryType,
    pub physical_start: u64,
    pub number_of_pages: u64,
    pub attribute: u64,
}

impl MemoryDescriptor {
    pub const EMPTY: Self = Self {
        memory_type: MemoryType::Reserved,
        physical_start: 0,
        number_of_pages: 0,
        attribute: 0,
    };

    pub const fn new(memory_type: MemoryType, physical_start: u64, number_of_pages: u64) -> Self {
        Self {
            memory_type,
            physical_start,
            number_of_pages,
            attribute: 0,
        }
    }

    /// Length in bytes (saturating on absurd page counts)
    pub fn len(&self) -> u64 {
        self.number_of_pages.saturating_mul(PAGE_SIZE)
    }

    pub fn is_empty(&self) -> bool {
        self.number_of_pages == 0
    }

    /// Exclusive end address
    pub fn end(&self) -> u64 {
        self.physical_start.saturating_add(self.len())
    }
}

/// A physical address range handed out by firmware (table, RAM chunk).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicalRange {
    pub address: u64,
    pub length: u64,
}

impl PhysicalRange {
    pub const fn new(address: u64, length: u64) -> Self {
        Self { address, length }
    }

    pub fn end(&self) -> Option<u64> {
        self.address.checked_add(self.length)
    }
}

/// Sort descriptors by ascending physical start.
///
/// Insertion sort: stable, in place, no allocation. Maps hold a few
/// hundred entries at most.
pub fn sort_memory_map(entries: &mut [MemoryDescriptor]) {
    for i in 1..entries.len() {
        let mut j = i;
        while j > 0 && entries[j - 1].physical_start > entries[j].physical_start {
            entries.swap(j - 1, j);
            j -= 1;
        }
    }
}

#[inline]
pub const fn is_page_aligned(value: u64) -> bool {
    value % PAGE_SIZE == 0
}
