// Fixed storage for a RAM capture
//
// Allocating while the memory map is being walked could change the very
// memory being dumped, so everything a capture needs is sized up front.

use core::sync::atomic::{AtomicBool, Ordering};

use super::encoder::ChunkList;
use crate::config::MAX_MEMORY_REGIONS;
use crate::memory::MemoryDescriptor;

/// Memory map snapshot and chunk list of one RAM capture.
pub struct RamArena {
    pub(crate) memmap: [MemoryDescriptor; MAX_MEMORY_REGIONS],
    pub(crate) chunks: ChunkList,
}

static mut STATIC_ARENA: RamArena = RamArena::new();
static STATIC_ARENA_TAKEN: AtomicBool = AtomicBool::new(false);

impl RamArena {
    pub const fn new() -> Self {
        Self {
            memmap: [MemoryDescriptor::EMPTY; MAX_MEMORY_REGIONS],
            chunks: ChunkList::new(),
        }
    }

    /// Hand out the process-wide static arena. Only the first call gets it.
    pub fn take_static() -> Option<&'static mut RamArena> {
        if STATIC_ARENA_TAKEN.swap(true, Ordering::SeqCst) {
            return None;
        }

        // SAFETY: the flag above lets exactly one caller through, so this is
        // the only reference ever created to STATIC_ARENA.
        Some(unsafe { &mut *core::ptr::addr_of_mut!(STATIC_ARENA) })
    }

    /// Chunks of the last capture built in this arena
    pub fn chunks(&self) -> &ChunkList {
        &self.chunks
    }
}

impl Default for RamArena {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive right to run a RAM capture.
///
/// Wraps the unique borrow of the arena. The reader keeps it while no RAM
/// session is open, moves it into the session on open, and takes it back on
/// close.
pub(crate) struct CaptureToken<'a> {
    arena: &'a mut RamArena,
}

impl<'a> CaptureToken<'a> {
    pub(crate) fn new(arena: &'a mut RamArena) -> Self {
        Self { arena }
    }

    pub(crate) fn arena(&self) -> &RamArena {
        self.arena
    }

    pub(crate) fn arena_mut(&mut self) -> &mut RamArena {
        self.arena
    }
}
