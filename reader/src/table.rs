// ACPI table source: `acpi:<signature>`

use crate::error::{ReaderError, Result};
use crate::firmware::{MemoryServices, TableServices};
use crate::log_error;
use crate::memory::PhysicalRange;

const SIGNATURE_LEN: usize = 4;

pub(crate) struct TableSource {
    range: PhysicalRange,
}

impl TableSource {
    pub(crate) fn open<T: TableServices>(tables: &mut T, args: &[&str]) -> Result<(Self, u64)> {
        let signature = match args {
            [signature] if signature.len() == SIGNATURE_LEN && signature.is_ascii() => *signature,
            _ => {
                log_error!("acpi takes exactly one 4-character signature");
                return Err(ReaderError::InvalidArgument);
            }
        };

        let range = tables.lookup_table(signature)?;
        Ok((Self { range }, range.length))
    }

    /// `len` bytes of the table starting `position` bytes in, viewed in place.
    pub(crate) fn read<'s, M: MemoryServices>(
        &self,
        memory: &'s M,
        position: u64,
        len: usize,
    ) -> Result<&'s [u8]> {
        let view = memory.physical_view(PhysicalRange::new(self.range.address + position, len as u64))?;
        if view.len() != len {
            log_error!("short table view at", self.range.address + position);
            return Err(ReaderError::IoError);
        }
        Ok(view)
    }
}
