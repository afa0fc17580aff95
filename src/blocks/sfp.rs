//! SFP cage status and control signals, one bit per port per register.
//!
//! Ports are 1-based addressing into four per-signal registers; there is no
//! per-port state beyond the bit each port occupies.

use super::{
    read_bit,
    write_bit,
    Polarity,
};
use crate::transport::{
    LpcBus,
    TransportResult,
};
use std::sync::{
    Mutex,
    Weak,
};
use thiserror::Error;

/// Number of SFP cages on the board
pub const PORT_COUNT: u8 = 8;

/// Per-port TX fault, bit (port - 1)
pub(crate) const SFP_TXFAULT: u16 = 0xA147;
/// Per-port RX loss of signal
pub(crate) const SFP_RXLOS: u16 = 0xA148;
/// Per-port module absent
pub(crate) const SFP_MODABS: u16 = 0xA149;
/// Per-port TX disable, the one writable SFP register
pub(crate) const SFP_TXDIS: u16 = 0xA14A;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] crate::transport::Error),
    #[error("SFP port index {0} is outside 1..=8")]
    InvalidPort(u8),
}

/// A validated 1-based SFP cage index
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PortIndex(u8);

impl PortIndex {
    /// Validate a 1-based port number
    /// # Errors
    /// Returns [`Error::InvalidPort`] outside 1..=8
    pub fn new(port: u8) -> Result<Self, Error> {
        if (1..=PORT_COUNT).contains(&port) {
            Ok(Self(port))
        } else {
            Err(Error::InvalidPort(port))
        }
    }

    /// The bit this port occupies in the per-signal registers
    #[must_use]
    pub fn bit(self) -> u8 {
        self.0 - 1
    }

    /// The 1-based port number
    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }
}

/// One SFP cage's signals
#[derive(Debug)]
pub struct SfpPort<T> {
    /// Upwards pointer to the parent device's bus
    transport: Weak<Mutex<T>>,
    port: PortIndex,
}

impl<T> SfpPort<T>
where
    T: LpcBus,
{
    #[must_use]
    pub(crate) fn new(transport: Weak<Mutex<T>>, port: PortIndex) -> Self {
        Self { transport, port }
    }

    /// Which cage this block addresses
    #[must_use]
    pub fn port(&self) -> PortIndex {
        self.port
    }

    fn read_signal(&self, addr: u16) -> TransportResult<bool> {
        let tarc = self.transport.upgrade().unwrap();
        let mut bus = (*tarc).lock().unwrap();
        read_bit(&mut *bus, addr, self.port.bit(), Polarity::ActiveHigh)
    }

    /// Whether the module reports a transmitter fault
    /// # Errors
    /// Returns an error on bad transport
    pub fn tx_fault(&self) -> TransportResult<bool> {
        self.read_signal(SFP_TXFAULT)
    }

    /// Whether the receiver sees no signal
    /// # Errors
    /// Returns an error on bad transport
    pub fn rx_los(&self) -> TransportResult<bool> {
        self.read_signal(SFP_RXLOS)
    }

    /// Whether the cage is empty
    /// # Errors
    /// Returns an error on bad transport
    pub fn mod_absent(&self) -> TransportResult<bool> {
        self.read_signal(SFP_MODABS)
    }

    /// Whether this port's transmitter is disabled
    /// # Errors
    /// Returns an error on bad transport
    pub fn tx_disable(&self) -> TransportResult<bool> {
        self.read_signal(SFP_TXDIS)
    }

    /// Disable or re-enable this port's transmitter, leaving every other
    /// port's bit alone
    /// # Errors
    /// Returns an error on bad transport
    #[allow(clippy::missing_panics_doc)]
    pub fn set_tx_disable(&self, disable: bool) -> TransportResult<()> {
        let tarc = self.transport.upgrade().unwrap();
        let mut bus = (*tarc).lock().unwrap();
        write_bit(&mut *bus, SFP_TXDIS, self.port.bit(), Polarity::ActiveHigh, disable)
    }
}
