//! Reset lines for the peripherals hanging off the CPLD.
//!
//! Every reset bit is active-low: 0 holds the device in reset, 1 releases
//! it. Bringup releases them all at once through
//! [`crate::core::Smc::deassert_resets`].

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
use tracing::debug;

/// Peripheral reset register, bits 4:0
pub(crate) const SPR_RESET: u16 = 0xA106;
/// Switch-ASIC reset register, bits 2:0
pub(crate) const ASIC_RESET: u16 = 0xA107;

/// One resettable device hanging off the CPLD
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ResetLine {
    /// I210 management NIC
    I210,
    /// First PCA9548 I2C mux
    Pca9548_0,
    /// Second PCA9548 I2C mux
    Pca9548_1,
    /// GPHY port LED controller
    GphyLed,
    /// 10G PHY port LED controller
    TenGphyLed,
    /// Switch ASIC IPROC subsystem
    AsicIproc,
    /// Switch ASIC PCIe endpoint
    AsicPe,
    /// Switch ASIC core
    Asic,
}

impl ResetLine {
    fn location(self) -> (u16, u8) {
        match self {
            ResetLine::I210 => (SPR_RESET, 0),
            ResetLine::Pca9548_0 => (SPR_RESET, 1),
            ResetLine::Pca9548_1 => (SPR_RESET, 2),
            ResetLine::GphyLed => (SPR_RESET, 3),
            ResetLine::TenGphyLed => (SPR_RESET, 4),
            ResetLine::AsicIproc => (ASIC_RESET, 0),
            ResetLine::AsicPe => (ASIC_RESET, 1),
            ResetLine::Asic => (ASIC_RESET, 2),
        }
    }
}

/// Control over the board's reset lines
#[derive(Debug)]
pub struct ResetControl<T> {
    /// Upwards pointer to the parent device's bus
    transport: Weak<Mutex<T>>,
}

impl<T> ResetControl<T>
where
    T: LpcBus,
{
    #[must_use]
    pub(crate) fn new(transport: Weak<Mutex<T>>) -> Self {
        Self { transport }
    }

    /// Whether `line` is currently held in reset
    /// # Errors
    /// Returns an error on bad transport
    #[allow(clippy::missing_panics_doc)]
    pub fn is_asserted(&self, line: ResetLine) -> TransportResult<bool> {
        let tarc = self.transport.upgrade().unwrap();
        let mut bus = (*tarc).lock().unwrap();
        let (addr, bit) = line.location();
        read_bit(&mut *bus, addr, bit, Polarity::ActiveLow)
    }

    /// Hold `line` in reset
    /// # Errors
    /// Returns an error on bad transport
    #[allow(clippy::missing_panics_doc)]
    pub fn assert(&self, line: ResetLine) -> TransportResult<()> {
        let tarc = self.transport.upgrade().unwrap();
        let mut bus = (*tarc).lock().unwrap();
        let (addr, bit) = line.location();
        write_bit(&mut *bus, addr, bit, Polarity::ActiveLow, true)?;
        debug!("asserted reset on {line:?}");
        Ok(())
    }

    /// Release `line` from reset
    /// # Errors
    /// Returns an error on bad transport
    #[allow(clippy::missing_panics_doc)]
    pub fn deassert(&self, line: ResetLine) -> TransportResult<()> {
        let tarc = self.transport.upgrade().unwrap();
        let mut bus = (*tarc).lock().unwrap();
        let (addr, bit) = line.location();
        write_bit(&mut *bus, addr, bit, Polarity::ActiveLow, false)?;
        debug!("released reset on {line:?}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::register_map,
        transport::mock::Mock,
    };
    use std::sync::Arc;

    #[test]
    fn test_reset_lines_are_active_low() {
        let bus = Arc::new(Mutex::new(Mock::new(register_map())));
        bus.lock().unwrap().write_byte(SPR_RESET, 0xFF).unwrap();
        let resets = ResetControl::new(Arc::downgrade(&bus));

        assert!(!resets.is_asserted(ResetLine::I210).unwrap());
        resets.assert(ResetLine::I210).unwrap();
        assert!(resets.is_asserted(ResetLine::I210).unwrap());
        assert_eq!(bus.lock().unwrap().read_byte(SPR_RESET).unwrap(), 0xFE);

        resets.deassert(ResetLine::I210).unwrap();
        assert!(!resets.is_asserted(ResetLine::I210).unwrap());
        assert_eq!(bus.lock().unwrap().read_byte(SPR_RESET).unwrap(), 0xFF);
    }

    #[test]
    fn test_asic_lines_use_their_own_register() {
        let bus = Arc::new(Mutex::new(Mock::new(register_map())));
        let resets = ResetControl::new(Arc::downgrade(&bus));
        resets.deassert(ResetLine::AsicPe).unwrap();
        let mut guard = bus.lock().unwrap();
        assert_eq!(guard.read_byte(ASIC_RESET).unwrap(), 0b0000_0010);
        assert_eq!(guard.read_byte(SPR_RESET).unwrap(), 0);
    }
}
