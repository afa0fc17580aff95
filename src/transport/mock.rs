//! Mock bus implementation used in testing the interface

use super::{LpcBus, TransportResult};
use crate::core::{Register, RegisterMap};
use std::collections::HashMap;

/// A register file that mocks reads and writes, useful for testing
#[derive(Debug)]
pub struct Mock {
    memory: HashMap<u16, u8>,
    registers: RegisterMap,
}

impl Mock {
    /// Construct a new mock register file by providing the map of known
    /// registers, all zero-initialized
    #[must_use]
    pub fn new(registers: RegisterMap) -> Self {
        // We'll represent each mapped byte lazily instead of a dense window
        // but it really shouldn't matter
        let mut memory: HashMap<u16, u8> = HashMap::default();

        for Register { addr, length } in registers.values() {
            for i in 0..*length {
                memory.insert(addr + i, 0u8);
            }
        }
        Self { memory, registers }
    }

    /// The map of registers this mock was built with
    #[must_use]
    pub fn registers(&self) -> RegisterMap {
        self.registers.clone()
    }
}

impl LpcBus for Mock {
    fn read_byte(&mut self, addr: u16) -> TransportResult<u8> {
        self.memory
            .get(&addr)
            .copied()
            .ok_or(super::Error::Unmapped(addr))
    }

    fn write_byte(&mut self, addr: u16, value: u8) -> TransportResult<()> {
        match self.memory.get_mut(&addr) {
            Some(byte) => {
                *byte = value;
                Ok(())
            }
            None => Err(super::Error::Unmapped(addr)),
        }
    }
}
