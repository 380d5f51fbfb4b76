//! Firmware Data Source Reader
//!
//! A `no_std` pull-based byte stream over low-level data sources, for tools
//! that dump them from a firmware environment.
//!
//! # Overview
//!
//! A source is named by a spec string `name:arg1:arg2...`:
//! - `ram[:start[:length]]` - live physical memory as an Android sparse image
//! - `part:<label>[:offset[:length]]` - a GPT partition or a sub-range of one
//! - `acpi:<signature>` - an ACPI table
//! - `efivar:<name>[:<vendor guid>]` - an EFI variable
//!
//! Numbers are hexadecimal. RAM boundaries must be page aligned.
//!
//! # Architecture
//!
//! ```text
//! spec string -> Reader::open -> Session { cursor, length, backend state }
//!                                   |
//!                  Reader::read  <--+  clamped to length - cursor
//!                                   |
//!                  Reader::close <--+  RAM arena handed back
//! ```
//!
//! The reader never calls firmware itself. Memory maps, physical memory,
//! disks, tables and variables all come through the traits in [`firmware`],
//! implemented by the embedding application.
//!
//! The RAM backend never allocates while capturing: the memory map snapshot
//! and chunk list live in a [`RamArena`] handed to the reader up front, and
//! only one RAM session can hold it.
//!
//! # Usage
//!
//! ```ignore
//! use morpheus_reader::{RamArena, Reader, ReaderConfig};
//!
//! let arena = RamArena::take_static().ok_or(ReaderError::Unsupported)?;
//! let mut reader = Reader::new(&mut platform, ReaderConfig::default())?
//!     .with_ram_arena(arena);
//!
//! let mut session = reader.open("ram:0:40000000")?;
//! loop {
//!     let chunk = reader.read(&mut session, 64 * 1024)?;
//!     if chunk.is_empty() {
//!         break;
//!     }
//!     send(chunk)?;
//! }
//! reader.close(session);
//! ```

#![no_std]

extern crate alloc;

pub mod config;
pub mod dispatch;
pub mod error;
pub mod firmware;
pub mod gpt;
pub mod logger;
pub mod memory;
pub mod ram;
pub mod registry;
pub mod session;
pub mod sparse;
pub mod spec;

mod partition;
mod table;
mod variable;

pub use config::ReaderConfig;
pub use dispatch::Reader;
pub use error::{ReaderError, Result};
pub use firmware::{
    DiskServices, MemoryServices, PartitionExtent, Platform, TableServices, VariableServices,
};
pub use gpt::{BlockIoRef, GptDisk};
pub use memory::{MemoryDescriptor, MemoryType, PhysicalRange};
pub use ram::RamArena;
pub use registry::SourceKind;
pub use session::Session;
pub use sparse::{ChunkHeader, ChunkType, SparseHeader};
pub use spec::SourceSpec;
pub use variable::find_vendor;
