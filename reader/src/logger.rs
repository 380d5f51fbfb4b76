// Allocation-free log ring for reader diagnostics
//
// Entries are fixed-size and live in a static array, so logging is safe
// while a RAM capture is in progress.

use core::sync::atomic::{AtomicUsize, Ordering};
use spin::Mutex;

const MAX_LOG_ENTRIES: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    pub fn prefix(&self) -> &'static str {
        match self {
            LogLevel::Error => "[ERR]",
            LogLevel::Warn => "[WARN]",
            LogLevel::Info => "[INFO]",
            LogLevel::Debug => "[DBG]",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: &'static str,
    pub value: Option<u64>,
}

struct LogRing {
    entries: [Option<LogEntry>; MAX_LOG_ENTRIES],
    next: usize,
    len: usize,
}

static LOG_RING: Mutex<LogRing> = Mutex::new(LogRing {
    entries: [None; MAX_LOG_ENTRIES],
    next: 0,
    len: 0,
});
static LOG_COUNT: AtomicUsize = AtomicUsize::new(0);

pub fn log(level: LogLevel, message: &'static str, value: Option<u64>) {
    LOG_COUNT.fetch_add(1, Ordering::SeqCst);

    let mut ring = LOG_RING.lock();
    let slot = ring.next;
    ring.entries[slot] = Some(LogEntry {
        level,
        message,
        value,
    });
    ring.next = (slot + 1) % MAX_LOG_ENTRIES;
    ring.len = (ring.len + 1).min(MAX_LOG_ENTRIES);
}

/// Copy of the ring, oldest entry first.
pub struct LogSnapshot {
    entries: [Option<LogEntry>; MAX_LOG_ENTRIES],
    len: usize,
}

impl LogSnapshot {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries[..self.len].iter().flatten()
    }
}

pub fn snapshot() -> LogSnapshot {
    let ring = LOG_RING.lock();
    let mut entries = [None; MAX_LOG_ENTRIES];
    let oldest = (ring.next + MAX_LOG_ENTRIES - ring.len) % MAX_LOG_ENTRIES;
    for i in 0..ring.len {
        entries[i] = ring.entries[(oldest + i) % MAX_LOG_ENTRIES];
    }
    LogSnapshot {
        entries,
        len: ring.len,
    }
}

/// Total entries logged since start, including ones already overwritten.
pub fn log_count() -> usize {
    LOG_COUNT.load(Ordering::SeqCst)
}

pub fn clear() {
    let mut ring = LOG_RING.lock();
    ring.entries = [None; MAX_LOG_ENTRIES];
    ring.next = 0;
    ring.len = 0;
}

#[macro_export]
macro_rules! log_error {
    ($msg:expr) => {
        $crate::logger::log($crate::logger::LogLevel::Error, $msg, None)
    };
    ($msg:expr, $value:expr) => {
        $crate::logger::log($crate::logger::LogLevel::Error, $msg, Some($value as u64))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($msg:expr) => {
        $crate::logger::log($crate::logger::LogLevel::Warn, $msg, None)
    };
    ($msg:expr, $value:expr) => {
        $crate::logger::log($crate::logger::LogLevel::Warn, $msg, Some($value as u64))
    };
}

#[macro_export]
macro_rules! log_info {
    ($msg:expr) => {
        $crate::logger::log($crate::logger::LogLevel::Info, $msg, None)
    };
    ($msg:expr, $value:expr) => {
        $crate::logger::log($crate::logger::LogLevel::Info, $msg, Some($value as u64))
    };
}

#[cfg(feature = "trace")]
#[macro_export]
macro_rules! log_debug {
    ($msg:expr) => {
        $crate::logger::log($crate::logger::LogLevel::Debug, $msg, None)
    };
    ($msg:expr, $value:expr) => {
        $crate::logger::log($crate::logger::LogLevel::Debug, $msg, Some($value as u64))
    };
}

#[cfg(not(feature = "trace"))]
#[macro_export]
macro_rules! log_debug {
    ($msg:expr) => {};
    ($msg:expr, $value:expr) => {
        let _ = $value;
    };
}
