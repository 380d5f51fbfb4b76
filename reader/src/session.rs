// Open reader sessions

use crate::partition::PartitionSource;
use crate::ram::RamSource;
use crate::registry::SourceKind;
use crate::table::TableSource;
use crate::variable::VariableSource;

/// Backend-owned part of a session.
pub(crate) enum SourceState<'a> {
    Ram(RamSource<'a>),
    Partition(PartitionSource),
    Table(TableSource),
    Variable(VariableSource),
}

impl SourceState<'_> {
    fn kind(&self) -> SourceKind {
        match self {
            SourceState::Ram(_) => SourceKind::Ram,
            SourceState::Partition(_) => SourceKind::Partition,
            SourceState::Table(_) => SourceKind::Table,
            SourceState::Variable(_) => SourceKind::Variable,
        }
    }
}

/// One open source: opened once, read until finished, closed once.
///
/// The cursor never passes the declared length. Sessions must be handed back
/// to [`Reader::close`](crate::Reader::close); a RAM session dropped instead
/// keeps the capture right with it.
#[must_use = "sessions must be handed back to `Reader::close`"]
pub struct Session<'a> {
    pub(crate) cursor: u64,
    pub(crate) length: u64,
    pub(crate) state: SourceState<'a>,
}

impl<'a> Session<'a> {
    pub(crate) fn new(length: u64, state: SourceState<'a>) -> Self {
        Self {
            cursor: 0,
            length,
            state,
        }
    }

    pub fn kind(&self) -> SourceKind {
        self.state.kind()
    }

    /// Bytes delivered so far
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Total length of the stream, fixed at open
    pub fn len(&self) -> u64 {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn remaining(&self) -> u64 {
        self.length - self.cursor
    }

    pub fn is_finished(&self) -> bool {
        self.cursor == self.length
    }
}

impl core::fmt::Debug for Session<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Session")
            .field("kind", &self.kind())
            .field("cursor", &self.cursor)
            .field("length", &self.length)
            .finish()
    }
}
