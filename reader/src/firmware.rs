//! Firmware collaborators
//!
//! The reader never calls firmware directly. Everything it needs from the
//! platform goes through these traits, so the same backends run on UEFI
//! boot services, on a post-ExitBootServices memory authority, or against
//! in-memory fakes in tests.
//!
//! Each trait is also implemented for `&mut T`, so a [`Reader`] can borrow
//! a platform instead of owning it.
//!
//! [`Reader`]: crate::Reader

use alloc::string::String;
use alloc::vec::Vec;
use uguid::Guid;

use crate::error::Result;
use crate::memory::{MemoryDescriptor, PhysicalRange};

/// Memory map and physical memory access.
pub trait MemoryServices {
    /// Snapshot the current memory map into `map`.
    ///
    /// Returns the number of descriptors written. Must not allocate, and
    /// must fail with `OutOfResources` when the map does not fit.
    fn memory_map(&mut self, map: &mut [MemoryDescriptor]) -> Result<usize>;

    /// Read-only view of a physical address range.
    ///
    /// The view is not copied. On identity-mapped firmware this is a slice
    /// over the address range itself.
    fn physical_view(&self, range: PhysicalRange) -> Result<&[u8]>;
}

/// Absolute placement of a partition on its block device, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionExtent {
    pub offset: u64,
    pub length: u64,
}

/// Partition metadata and byte-granular disk reads.
pub trait DiskServices {
    /// Resolve a partition by label.
    fn lookup_partition(&mut self, label: &str) -> Result<PartitionExtent>;

    /// Fill `buffer` from the absolute byte `offset` of the device.
    fn read_disk(&mut self, offset: u64, buffer: &mut [u8]) -> Result<()>;
}

/// Firmware configuration tables.
pub trait TableServices {
    /// Locate an ACPI table by its four-character signature.
    fn lookup_table(&mut self, signature: &str) -> Result<PhysicalRange>;
}

/// Firmware variable store.
pub trait VariableServices {
    /// Advance an enumeration of variable names.
    ///
    /// Start with an empty `name`. On each call the pair is replaced by the
    /// next variable; returns `false` once the store is exhausted.
    fn next_variable_name(&mut self, name: &mut String, vendor: &mut Guid) -> Result<bool>;

    /// Read a variable's content into an owned buffer.
    fn read_variable(&mut self, name: &str, vendor: &Guid) -> Result<Vec<u8>>;
}

/// Everything a [`Reader`](crate::Reader) needs from the platform.
pub trait Platform: MemoryServices + DiskServices + TableServices + VariableServices {}

impl<T> Platform for T where T: MemoryServices + DiskServices + TableServices + VariableServices {}

impl<T: MemoryServices + ?Sized> MemoryServices for &mut T {
    fn memory_map(&mut self, map: &mut [MemoryDescriptor]) -> Result<usize> {
        (**self).memory_map(map)
    }

    fn physical_view(&self, range: PhysicalRange) -> Result<&[u8]> {
        (**self).physical_view(range)
    }
}

impl<T: DiskServices + ?Sized> DiskServices for &mut T {
    fn lookup_partition(&mut self, label: &str) -> Result<PartitionExtent> {
        (**self).lookup_partition(label)
    }

    fn read_disk(&mut self, offset: u64, buffer: &mut [u8]) -> Result<()> {
        (**self).read_disk(offset, buffer)
    }
}

impl<T: TableServices + ?Sized> TableServices for &mut T {
    fn lookup_table(&mut self, signature: &str) -> Result<PhysicalRange> {
        (**self).lookup_table(signature)
    }
}

impl<T: VariableServices + ?Sized> VariableServices for &mut T {
    fn next_variable_name(&mut self, name: &mut String, vendor: &mut Guid) -> Result<bool> {
        (**self).next_variable_name(name, vendor)
    }

    fn read_variable(&mut self, name: &str, vendor: &Guid) -> Result<Vec<u8>> {
        (**self).read_variable(name, vendor)
    }
}
