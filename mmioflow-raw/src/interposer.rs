//! Redirecting register accesses away from real memory
//!
//! A register with an interposer attached sends every load and store to it
//! instead of issuing a volatile access. [`TracingInterposer`] backs the
//! accesses with a sparse byte memory and records each one, which is what
//! most tests want.

use std::collections::HashMap;
use std::fmt;

use parking_lot::Mutex;

use crate::storage::RegisterWidth;

/// Receiver of redirected register accesses
///
/// Values travel widened to `u64`; only the low `width` bits are meaningful.
pub trait Interposer {
    fn load(&self, address: usize, width: RegisterWidth) -> u64;
    fn store(&self, address: usize, width: RegisterWidth, value: u64);
}

/// One recorded access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterposerEvent {
    Load {
        address: usize,
        width: RegisterWidth,
        value: u64,
    },
    Store {
        address: usize,
        width: RegisterWidth,
        value: u64,
    },
}

impl InterposerEvent {
    pub fn load<T: Into<u64>>(address: usize, width: RegisterWidth, value: T) -> Self {
        InterposerEvent::Load {
            address,
            width,
            value: value.into(),
        }
    }

    pub fn store<T: Into<u64>>(address: usize, width: RegisterWidth, value: T) -> Self {
        InterposerEvent::Store {
            address,
            width,
            value: value.into(),
        }
    }

    pub fn address(&self) -> usize {
        match self {
            InterposerEvent::Load { address, .. } | InterposerEvent::Store { address, .. } => {
                *address
            }
        }
    }
}

impl fmt::Display for InterposerEvent {
    /// `m[0x1000] -> 0x00000001` for loads, `<-` for stores
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (arrow, address, width, value) = match *self {
            InterposerEvent::Load {
                address,
                width,
                value,
            } => ("->", address, width, value),
            InterposerEvent::Store {
                address,
                width,
                value,
            } => ("<-", address, width, value),
        };
        let digits = (width.bits() / 4) as usize + 2;
        write!(f, "m[{address:#x}] {arrow} {value:#0digits$x}")
    }
}

#[derive(Debug, Default)]
struct TracingState {
    memory: HashMap<usize, u8>,
    trace: Vec<InterposerEvent>,
}

/// Sparse little-endian memory that records every access
///
/// Unwritten bytes read as zero. Accesses must be aligned to their width.
#[derive(Debug, Default)]
pub struct TracingInterposer {
    state: Mutex<TracingState>,
}

impl TracingInterposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded events, oldest first
    pub fn trace(&self) -> Vec<InterposerEvent> {
        self.state.lock().trace.clone()
    }

    pub fn clear_trace(&self) {
        self.state.lock().trace.clear();
    }

    pub fn load_count(&self) -> usize {
        self.state
            .lock()
            .trace
            .iter()
            .filter(|event| matches!(event, InterposerEvent::Load { .. }))
            .count()
    }

    pub fn store_count(&self) -> usize {
        self.state
            .lock()
            .trace
            .iter()
            .filter(|event| matches!(event, InterposerEvent::Store { .. }))
            .count()
    }

    /// Set memory contents without recording an event
    pub fn poke(&self, address: usize, width: RegisterWidth, value: u64) {
        write_bytes(&mut self.state.lock().memory, address, width, value);
    }

    /// Read memory contents without recording an event
    pub fn peek(&self, address: usize, width: RegisterWidth) -> u64 {
        read_bytes(&self.state.lock().memory, address, width)
    }
}

fn assert_aligned(address: usize, width: RegisterWidth) {
    assert!(
        address % width.bytes() == 0,
        "unaligned {}-bit access at {:#x}",
        width.bits(),
        address
    );
}

fn read_bytes(memory: &HashMap<usize, u8>, address: usize, width: RegisterWidth) -> u64 {
    (0..width.bytes()).fold(0u64, |value, index| {
        let byte = memory.get(&(address + index)).copied().unwrap_or(0);
        value | (u64::from(byte) << (8 * index))
    })
}

fn write_bytes(memory: &mut HashMap<usize, u8>, address: usize, width: RegisterWidth, value: u64) {
    for index in 0..width.bytes() {
        memory.insert(address + index, (value >> (8 * index)) as u8);
    }
}

impl Interposer for TracingInterposer {
    fn load(&self, address: usize, width: RegisterWidth) -> u64 {
        assert_aligned(address, width);
        let mut state = self.state.lock();
        let value = read_bytes(&state.memory, address, width);
        state.trace.push(InterposerEvent::Load {
            address,
            width,
            value,
        });
        value
    }

    fn store(&self, address: usize, width: RegisterWidth, value: u64) {
        assert_aligned(address, width);
        let value = value & width.mask();
        let mut state = self.state.lock();
        write_bytes(&mut state.memory, address, width, value);
        state.trace.push(InterposerEvent::Store {
            address,
            width,
            value,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_little_endian_memory() {
        let interposer = TracingInterposer::new();
        interposer.store(0x100, RegisterWidth::W32, 0x1234_5678);
        assert_eq!(interposer.peek(0x100, RegisterWidth::W8), 0x78);
        assert_eq!(interposer.peek(0x102, RegisterWidth::W16), 0x1234);
        assert_eq!(interposer.load(0x100, RegisterWidth::W64), 0x1234_5678);
        assert_eq!(interposer.load(0x200, RegisterWidth::W16), 0);
    }

    #[test]
    fn test_trace_and_counts() {
        let interposer = TracingInterposer::new();
        interposer.poke(0x10, RegisterWidth::W8, 0xAB);
        assert!(interposer.trace().is_empty());

        interposer.load(0x10, RegisterWidth::W8);
        interposer.store(0x10, RegisterWidth::W8, 0x1CD);
        assert_eq!(
            interposer.trace(),
            vec![
                InterposerEvent::load(0x10, RegisterWidth::W8, 0xABu8),
                InterposerEvent::store(0x10, RegisterWidth::W8, 0xCDu8),
            ]
        );
        assert_eq!(interposer.load_count(), 1);
        assert_eq!(interposer.store_count(), 1);

        interposer.clear_trace();
        assert_eq!(interposer.load_count(), 0);
    }

    #[test]
    fn test_event_display() {
        let load = InterposerEvent::load(0x1000, RegisterWidth::W32, 1u32);
        let store = InterposerEvent::store(0x1004, RegisterWidth::W8, 0xA5u8);
        assert_eq!(load.to_string(), "m[0x1000] -> 0x00000001");
        assert_eq!(store.to_string(), "m[0x1004] <- 0xa5");
        assert_eq!(store.address(), 0x1004);
    }

    #[test]
    #[should_panic(expected = "unaligned 32-bit access at 0x2")]
    fn test_unaligned_access_panics() {
        TracingInterposer::new().load(0x2, RegisterWidth::W32);
    }
}
