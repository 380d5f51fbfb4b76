//! GPT partition streaming
//!
//! `part:<label>[:offset[:length]]` streams a partition, or a sub-range of
//! one, through a bounded buffer that is refilled from disk only once the
//! caller has drained it.

use alloc::vec::Vec;

use crate::error::{ReaderError, Result};
use crate::firmware::DiskServices;
use crate::spec::parse_hex;
use crate::{log_debug, log_error};

/// Backend state of an open partition session.
pub(crate) struct PartitionSource {
    /// Absolute device offset of the next refill
    position: u64,
    buffer: Vec<u8>,
    /// Consumed bytes of the current fill
    buf_cur: usize,
    /// Valid bytes of the current fill
    buf_len: usize,
}

impl PartitionSource {
    /// Resolve the label, validate the sub-range and allocate the buffer.
    ///
    /// Returns the source and the session length.
    pub(crate) fn open<D: DiskServices>(
        disk: &mut D,
        args: &[&str],
        capacity: usize,
    ) -> Result<(Self, u64)> {
        let (label, rest) = match args {
            [label, rest @ ..] if rest.len() <= 2 => (*label, rest),
            _ => {
                log_error!("part takes a label and at most 2 arguments");
                return Err(ReaderError::InvalidArgument);
            }
        };

        let offset = match rest.first() {
            Some(arg) => parse_hex(arg)?,
            None => 0,
        };
        let length = match rest.get(1) {
            Some(arg) => Some(parse_hex(arg)?),
            None => None,
        };

        let extent = disk.lookup_partition(label)?;

        if offset >= extent.length {
            log_error!("offset is beyond the partition end", offset);
            return Err(ReaderError::InvalidArgument);
        }

        let session_len = match length {
            Some(0) => {
                log_error!("sub-range length must not be zero");
                return Err(ReaderError::InvalidArgument);
            }
            Some(length) => {
                let fits = offset
                    .checked_add(length)
                    .map_or(false, |end| end <= extent.length);
                if !fits {
                    log_error!("sub-range runs past the partition end", length);
                    return Err(ReaderError::InvalidArgument);
                }
                length
            }
            None => extent.length - offset,
        };

        let position = extent.offset.checked_add(offset).ok_or_else(|| {
            log_error!("partition offset overflows the device");
            ReaderError::InvalidArgument
        })?;

        let size = usize::try_from(session_len)
            .map_or(capacity, |len| len.min(capacity));
        let mut buffer = Vec::new();
        buffer.try_reserve_exact(size).map_err(|_| {
            log_error!("cannot allocate partition buffer", size);
            ReaderError::OutOfResources
        })?;
        buffer.resize(size, 0);

        log_debug!("partition session opened, length", session_len);

        Ok((
            Self {
                position,
                buffer,
                buf_cur: 0,
                buf_len: 0,
            },
            session_len,
        ))
    }

    /// Next slice of the partition; `remaining` is what the session still owes.
    pub(crate) fn read<D: DiskServices>(
        &mut self,
        disk: &mut D,
        remaining: u64,
        len: usize,
    ) -> Result<&[u8]> {
        if self.buf_cur == self.buf_len {
            let fill = usize::try_from(remaining)
                .map_or(self.buffer.len(), |rem| rem.min(self.buffer.len()));

            disk.read_disk(self.position, &mut self.buffer[..fill])
                .map_err(|err| {
                    log_error!("partition read failed at", self.position);
                    err
                })?;

            log_debug!("partition buffer refilled", fill);
            self.position += fill as u64;
            self.buf_cur = 0;
            self.buf_len = fill;
        }

        let n = len.min(self.buf_len - self.buf_cur);
        let start = self.buf_cur;
        self.buf_cur += n;
        Ok(&self.buffer[start..start + n])
    }

    #[cfg(test)]
    fn buffer_len(&self) -> usize {
        self.buffer.len()
    }
}
