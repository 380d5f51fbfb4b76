//! Error types for reader operations

use core::fmt;

/// Result type for reader operations
pub type Result<T> = core::result::Result<T, ReaderError>;

const EFI_ERROR_BIT: usize = 1usize << (usize::BITS - 1);

/// Raw UEFI status codes the reader maps to and from.
pub mod status {
    use super::EFI_ERROR_BIT;

    pub const EFI_SUCCESS: usize = 0;
    pub const EFI_INVALID_PARAMETER: usize = EFI_ERROR_BIT | 2;
    pub const EFI_UNSUPPORTED: usize = EFI_ERROR_BIT | 3;
    pub const EFI_BUFFER_TOO_SMALL: usize = EFI_ERROR_BIT | 5;
    pub const EFI_DEVICE_ERROR: usize = EFI_ERROR_BIT | 7;
    pub const EFI_OUT_OF_RESOURCES: usize = EFI_ERROR_BIT | 9;
    pub const EFI_NOT_FOUND: usize = EFI_ERROR_BIT | 14;
}

/// Errors that can occur while opening or reading a source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderError {
    /// Malformed spec string, misaligned or out-of-range boundaries,
    /// overlapping memory map, unreachable boundary
    InvalidArgument,

    /// Fixed-capacity buffer exceeded or allocation failure
    OutOfResources,

    /// Unknown backend, RAM capture already in progress, ambiguous variable name
    Unsupported,

    /// Unknown partition, table or variable
    NotFound,

    /// Block device or firmware call failure
    IoError,
}

impl ReaderError {
    /// Map a failing UEFI status onto the reader taxonomy.
    ///
    /// Returns `None` for `EFI_SUCCESS` and for warning codes (error bit clear).
    pub fn from_efi_status(code: usize) -> Option<Self> {
        if code & EFI_ERROR_BIT == 0 {
            return None;
        }

        Some(match code {
            status::EFI_INVALID_PARAMETER => Self::InvalidArgument,
            status::EFI_OUT_OF_RESOURCES | status::EFI_BUFFER_TOO_SMALL => Self::OutOfResources,
            status::EFI_UNSUPPORTED => Self::Unsupported,
            status::EFI_NOT_FOUND => Self::NotFound,
            _ => Self::IoError,
        })
    }

    /// UEFI status reported to firmware callers for this error.
    pub fn efi_status(&self) -> usize {
        match self {
            Self::InvalidArgument => status::EFI_INVALID_PARAMETER,
            Self::OutOfResources => status::EFI_OUT_OF_RESOURCES,
            Self::Unsupported => status::EFI_UNSUPPORTED,
            Self::NotFound => status::EFI_NOT_FOUND,
            Self::IoError => status::EFI_DEVICE_ERROR,
        }
    }
}

/// Convert a raw UEFI status into a `Result`.
pub fn check_efi_status(code: usize) -> Result<()> {
    match ReaderError::from_efi_status(code) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

impl fmt::Display for ReaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument => write!(f, "Invalid argument"),
            Self::OutOfResources => write!(f, "Out of resources"),
            Self::Unsupported => write!(f, "Unsupported operation"),
            Self::NotFound => write!(f, "Not found"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
