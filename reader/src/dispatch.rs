//! Session dispatch
//!
//! The [`Reader`] resolves spec strings to backends and enforces the stream
//! contract for all of them: reads are clamped to what the session still
//! owes, the cursor only moves by what a backend actually delivered, and a
//! finished session answers further reads with an empty slice.

use crate::config::ReaderConfig;
use crate::error::{ReaderError, Result};
use crate::firmware::Platform;
use crate::partition::PartitionSource;
use crate::ram::{self, CaptureToken, RamArena, RamSource};
use crate::registry::SourceKind;
use crate::session::{Session, SourceState};
use crate::spec::SourceSpec;
use crate::table::TableSource;
use crate::variable::VariableSource;
use crate::{log_debug, log_error, log_info};

/// Opens, reads and closes sessions over a [`Platform`].
pub struct Reader<'a, P: Platform> {
    platform: P,
    config: ReaderConfig,
    /// Present while no RAM session is open and an arena was attached
    capture: Option<CaptureToken<'a>>,
}

impl<'a, P: Platform> Reader<'a, P> {
    pub fn new(platform: P, config: ReaderConfig) -> Result<Self> {
        if config.partition_buffer_size == 0 {
            log_error!("partition buffer size must not be zero");
            return Err(ReaderError::InvalidArgument);
        }

        Ok(Self {
            platform,
            config,
            capture: None,
        })
    }

    /// Attach the storage RAM captures run in. Without it `ram` is unsupported.
    pub fn with_ram_arena(mut self, arena: &'a mut RamArena) -> Self {
        self.capture = Some(CaptureToken::new(arena));
        self
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    pub fn into_platform(self) -> P {
        self.platform
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Whether a `ram` session could be opened right now.
    pub fn ram_available(&self) -> bool {
        self.capture.is_some()
    }

    /// Open a session on the source named by `spec`.
    pub fn open(&mut self, spec: &str) -> Result<Session<'a>> {
        let parsed = SourceSpec::parse(spec)?;
        let kind = SourceKind::from_name(parsed.name()).ok_or_else(|| {
            log_error!("no reader registered under that name");
            ReaderError::Unsupported
        })?;
        let args = parsed.args();

        let (length, state) = match kind {
            SourceKind::Ram => self.open_ram(args)?,
            SourceKind::Partition => {
                let (source, length) = PartitionSource::open(
                    &mut self.platform,
                    args,
                    self.config.partition_buffer_size,
                )?;
                (length, SourceState::Partition(source))
            }
            SourceKind::Table => {
                let (source, length) = TableSource::open(&mut self.platform, args)?;
                (length, SourceState::Table(source))
            }
            SourceKind::Variable => {
                let (source, length) = VariableSource::open(&mut self.platform, args)?;
                (length, SourceState::Variable(source))
            }
        };

        log_info!("session opened, length", length);
        Ok(Session::new(length, state))
    }

    fn open_ram(&mut self, args: &[&str]) -> Result<(u64, SourceState<'a>)> {
        let mut token = self.capture.take().ok_or_else(|| {
            log_error!("RAM capture unavailable or already in progress");
            ReaderError::Unsupported
        })?;

        match ram::prepare(token.arena_mut(), args, &mut self.platform) {
            Ok(layout) => {
                let source = RamSource::new(token, &layout);
                Ok((layout.stream_len, SourceState::Ram(source)))
            }
            Err(err) => {
                self.capture = Some(token);
                Err(err)
            }
        }
    }

    /// Next slice of `session`, at most `max_len` bytes.
    ///
    /// The slice is valid until the next call on this reader or session.
    /// An empty slice means the session is finished (or `max_len` was zero).
    pub fn read<'s>(&'s mut self, session: &'s mut Session<'a>, max_len: usize) -> Result<&'s [u8]> {
        let remaining = session.remaining();
        let len = usize::try_from(remaining).map_or(max_len, |rem| rem.min(max_len));
        if len == 0 {
            return Ok(&[]);
        }

        let position = session.cursor;
        let out = match &mut session.state {
            SourceState::Ram(source) => source.read(&self.platform, len)?,
            SourceState::Partition(source) => source.read(&mut self.platform, remaining, len)?,
            SourceState::Table(source) => source.read(&self.platform, position, len)?,
            SourceState::Variable(source) => source.read(position, len)?,
        };

        if out.is_empty() {
            log_error!("backend returned no data at", position);
            return Err(ReaderError::IoError);
        }

        session.cursor += out.len() as u64;
        log_debug!("read, cursor now", session.cursor);
        Ok(out)
    }

    /// Close `session`, releasing its resources.
    pub fn close(&mut self, session: Session<'a>) {
        if let SourceState::Ram(source) = session.state {
            self.capture = Some(source.into_token());
        }
        log_debug!("session closed");
    }
}
