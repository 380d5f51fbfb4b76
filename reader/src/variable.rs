//! EFI variable source
//!
//! `efivar:<name>[:<vendor guid>]` reads one variable into an owned buffer.
//! Without a vendor the variable store is enumerated and the name has to be
//! unique across vendors.

use alloc::string::String;
use alloc::vec::Vec;
use uguid::Guid;

use crate::error::{ReaderError, Result};
use crate::firmware::VariableServices;
use crate::{log_debug, log_error};

pub(crate) struct VariableSource {
    data: Vec<u8>,
}

impl VariableSource {
    pub(crate) fn open<V: VariableServices>(variables: &mut V, args: &[&str]) -> Result<(Self, u64)> {
        let (name, vendor) = match args {
            [name] => (*name, find_vendor(variables, name)?),
            [name, guid] => {
                let vendor = Guid::try_parse(guid).map_err(|_| {
                    log_error!("malformed vendor GUID");
                    ReaderError::InvalidArgument
                })?;
                (*name, vendor)
            }
            _ => {
                log_error!("efivar takes a name and an optional vendor GUID");
                return Err(ReaderError::InvalidArgument);
            }
        };

        let data = variables.read_variable(name, &vendor)?;
        let len = data.len() as u64;
        log_debug!("variable read, bytes", len);
        Ok((Self { data }, len))
    }

    pub(crate) fn read(&self, position: u64, len: usize) -> Result<&[u8]> {
        let start = usize::try_from(position).map_err(|_| ReaderError::InvalidArgument)?;
        self.data
            .get(start..start + len)
            .ok_or(ReaderError::InvalidArgument)
    }
}

/// Enumerate the store for the single vendor that owns `name`.
pub fn find_vendor<V: VariableServices>(variables: &mut V, name: &str) -> Result<Guid> {
    let mut current = String::new();
    let mut vendor = Guid::ZERO;
    let mut found = None;

    while variables.next_variable_name(&mut current, &mut vendor)? {
        if current != name {
            continue;
        }
        if found.is_some() {
            log_error!("variable name is ambiguous, give a vendor GUID");
            return Err(ReaderError::Unsupported);
        }
        found = Some(vendor);
    }

    found.ok_or_else(|| {
        log_error!("variable not found");
        ReaderError::NotFound
    })
}
