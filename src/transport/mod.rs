//! The bus transports that reach the CPLD's I/O-port register window

pub mod devport;
pub mod mock;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    DevPort(#[from] devport::Error),
    #[error("No CPLD register is mapped at 0x{0:04x}")]
    Unmapped(u16),
}

pub type TransportResult<T> = Result<T, Error>;

/// The trait that is implemented for every way of reaching the SMC's
/// register window. Registers are byte-wide and addressed by their 16-bit
/// legacy I/O-port address; there is no wider access.
///
/// Methods take `&mut self` on purpose: shared access is serialized by the
/// mutex that owns the bus (see [`crate::core::Smc`]), and a
/// read-modify-write pair must happen under a single acquisition of that
/// mutex so concurrent callers can't interleave between the read and the
/// write.
pub trait LpcBus {
    /// Read the byte stored in the register at `addr`
    fn read_byte(&mut self, addr: u16) -> TransportResult<u8>;

    /// Write one byte to the register at `addr`
    fn write_byte(&mut self, addr: u16, value: u8) -> TransportResult<()>;
}
