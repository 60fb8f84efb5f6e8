//! Mock register bus for testing

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::registers::{ID_MAGIC, REG_ID};
use crate::{LinkError, LinkResult, RegisterBus};

#[derive(Debug, Default)]
struct MockBusState {
    /// Values returned for plain register reads
    registers: HashMap<u8, u8>,
    /// Every write that reached the bus, in order
    writes: Vec<(u8, Vec<u8>)>,
    /// Number of reads seen per register
    read_counts: HashMap<u8, u32>,
    /// Identity reads start answering the magic byte from this attempt
    /// (1-based). None simulates an absent controller.
    present_after: Option<u32>,
    fail_reads: bool,
    fail_writes: bool,
}

/// Scriptable in-memory register bus. Clones share state, so a test
/// can keep a handle for inspection after handing the bus to a
/// `ControllerLink`.
#[derive(Debug, Clone)]
pub struct MockBus {
    inner: Arc<Mutex<MockBusState>>,
}

impl MockBus {
    /// A controller that answers the handshake immediately
    pub fn present() -> Self {
        Self::present_after(1)
    }

    /// A controller that never answers the handshake
    pub fn absent() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockBusState::default())),
        }
    }

    /// A controller that answers the handshake from the given attempt
    /// (1-based) onwards
    pub fn present_after(attempt: u32) -> Self {
        let bus = Self::absent();
        bus.inner.lock().unwrap().present_after = Some(attempt);
        bus
    }

    pub fn set_register(&self, register: u8, value: u8) {
        self.inner.lock().unwrap().registers.insert(register, value);
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.inner.lock().unwrap().fail_reads = fail;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.lock().unwrap().fail_writes = fail;
    }

    /// All writes observed so far
    pub fn writes(&self) -> Vec<(u8, Vec<u8>)> {
        self.inner.lock().unwrap().writes.clone()
    }

    /// How many times the given register was read
    pub fn read_count(&self, register: u8) -> u32 {
        self.inner
            .lock()
            .unwrap()
            .read_counts
            .get(&register)
            .copied()
            .unwrap_or(0)
    }
}

impl RegisterBus for MockBus {
    fn read_register(&mut self, register: u8) -> LinkResult<u8> {
        let mut state = self.inner.lock().unwrap();

        if state.fail_reads {
            return Err(LinkError::Io("mock read failure".into()));
        }

        let count = state.read_counts.entry(register).or_insert(0);
        *count += 1;
        let count = *count;

        if register == REG_ID {
            return match state.present_after {
                Some(from) if count >= from => Ok(ID_MAGIC),
                _ => Ok(0x00),
            };
        }

        Ok(state.registers.get(&register).copied().unwrap_or(0))
    }

    fn write_register(&mut self, register: u8, payload: &[u8]) -> LinkResult<()> {
        let mut state = self.inner.lock().unwrap();

        if state.fail_writes {
            return Err(LinkError::Io("mock write failure".into()));
        }

        state.writes.push((register, payload.to_vec()));
        Ok(())
    }
}
