//! PSU presence, power-good, alert, and enable signals.
//!
//! Both supplies share one status register, one bit per signal per side.

use super::{
    read_bit,
    write_bit,
    Polarity,
};
use crate::transport::{
    LpcBus,
    TransportResult,
};
use packed_struct::prelude::*;
use std::sync::{
    Mutex,
    Weak,
};

/// PSU status/control register
pub(crate) const PSU_STAT: u16 = 0xA141;

// Bit positions within the status register
pub(crate) const PSUR_ALERT: u8 = 7;
pub(crate) const PSUL_ALERT: u8 = 6;
pub(crate) const PSUR_PRS: u8 = 5;
pub(crate) const PSUL_PRS: u8 = 4;
pub(crate) const PSUR_PWOK: u8 = 3;
pub(crate) const PSUL_PWOK: u8 = 2;
pub(crate) const PSUR_ENB: u8 = 1;
pub(crate) const PSUL_ENB: u8 = 0;

/// The whole PSU status register decoded field-by-field
#[derive(PackedStruct, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[packed_struct(bit_numbering = "lsb0", size_bytes = "1")]
#[allow(clippy::struct_excessive_bools)]
pub struct PsuStatus {
    #[packed_field(bits = "7")]
    pub alert_right: bool,
    #[packed_field(bits = "6")]
    pub alert_left: bool,
    #[packed_field(bits = "5")]
    pub present_right: bool,
    #[packed_field(bits = "4")]
    pub present_left: bool,
    #[packed_field(bits = "3")]
    pub power_ok_right: bool,
    #[packed_field(bits = "2")]
    pub power_ok_left: bool,
    #[packed_field(bits = "1")]
    pub enabled_right: bool,
    #[packed_field(bits = "0")]
    pub enabled_left: bool,
}

impl PsuStatus {
    #[must_use]
    pub fn decode(byte: u8) -> Self {
        Self::unpack(&[byte]).unwrap_or_default()
    }
}

/// Which of the two power supplies
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PsuSide {
    Left,
    Right,
}

impl PsuSide {
    fn present_bit(self) -> u8 {
        match self {
            PsuSide::Left => PSUL_PRS,
            PsuSide::Right => PSUR_PRS,
        }
    }

    fn power_ok_bit(self) -> u8 {
        match self {
            PsuSide::Left => PSUL_PWOK,
            PsuSide::Right => PSUR_PWOK,
        }
    }

    fn alert_bit(self) -> u8 {
        match self {
            PsuSide::Left => PSUL_ALERT,
            PsuSide::Right => PSUR_ALERT,
        }
    }

    fn enable_bit(self) -> u8 {
        match self {
            PsuSide::Left => PSUL_ENB,
            PsuSide::Right => PSUR_ENB,
        }
    }
}

/// One power supply's slice of the status register
#[derive(Debug)]
pub struct Psu<T> {
    /// Upwards pointer to the parent device's bus
    transport: Weak<Mutex<T>>,
    side: PsuSide,
}

impl<T> Psu<T>
where
    T: LpcBus,
{
    #[must_use]
    pub(crate) fn new(transport: Weak<Mutex<T>>, side: PsuSide) -> Self {
        Self { transport, side }
    }

    /// Which side this block addresses
    #[must_use]
    pub fn side(&self) -> PsuSide {
        self.side
    }

    /// Whether a supply is seated in this slot
    /// # Errors
    /// Returns an error on bad transport
    #[allow(clippy::missing_panics_doc)]
    pub fn present(&self) -> TransportResult<bool> {
        let tarc = self.transport.upgrade().unwrap();
        let mut bus = (*tarc).lock().unwrap();
        read_bit(&mut *bus, PSU_STAT, self.side.present_bit(), Polarity::ActiveHigh)
    }

    /// Whether this supply reports its output in regulation
    /// # Errors
    /// Returns an error on bad transport
    #[allow(clippy::missing_panics_doc)]
    pub fn power_ok(&self) -> TransportResult<bool> {
        let tarc = self.transport.upgrade().unwrap();
        let mut bus = (*tarc).lock().unwrap();
        read_bit(&mut *bus, PSU_STAT, self.side.power_ok_bit(), Polarity::ActiveHigh)
    }

    /// Whether this supply is raising its alert line
    /// # Errors
    /// Returns an error on bad transport
    #[allow(clippy::missing_panics_doc)]
    pub fn alert(&self) -> TransportResult<bool> {
        let tarc = self.transport.upgrade().unwrap();
        let mut bus = (*tarc).lock().unwrap();
        read_bit(&mut *bus, PSU_STAT, self.side.alert_bit(), Polarity::ActiveHigh)
    }

    /// Whether this supply's output is enabled
    /// # Errors
    /// Returns an error on bad transport
    #[allow(clippy::missing_panics_doc)]
    pub fn enabled(&self) -> TransportResult<bool> {
        let tarc = self.transport.upgrade().unwrap();
        let mut bus = (*tarc).lock().unwrap();
        read_bit(&mut *bus, PSU_STAT, self.side.enable_bit(), Polarity::ActiveHigh)
    }

    /// Enable or disable this supply's output. The other side's bits are
    /// untouched.
    /// # Errors
    /// Returns an error on bad transport
    #[allow(clippy::missing_panics_doc)]
    pub fn set_enable(&self, on: bool) -> TransportResult<()> {
        let tarc = self.transport.upgrade().unwrap();
        let mut bus = (*tarc).lock().unwrap();
        write_bit(&mut *bus, PSU_STAT, self.side.enable_bit(), Polarity::ActiveHigh, on)
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

    fn mock_bus() -> Arc<Mutex<Mock>> {
        Arc::new(Mutex::new(Mock::new(register_map())))
    }

    #[test]
    fn test_status_decode() {
        let status = PsuStatus::decode(0b1010_0101);
        assert!(status.alert_right);
        assert!(!status.alert_left);
        assert!(status.present_right);
        assert!(!status.present_left);
        assert!(!status.power_ok_right);
        assert!(status.power_ok_left);
        assert!(!status.enabled_right);
        assert!(status.enabled_left);
    }

    #[test]
    fn test_read_signals() {
        let bus = mock_bus();
        // Left present + left power ok + right alert
        bus.lock().unwrap().write_byte(PSU_STAT, 0b1001_0100).unwrap();
        let left = Psu::new(Arc::downgrade(&bus), PsuSide::Left);
        let right = Psu::new(Arc::downgrade(&bus), PsuSide::Right);
        assert!(left.present().unwrap());
        assert!(left.power_ok().unwrap());
        assert!(!left.alert().unwrap());
        assert!(!right.present().unwrap());
        assert!(!right.power_ok().unwrap());
        assert!(right.alert().unwrap());
    }

    #[test]
    fn test_set_enable_both_directions() {
        let bus = mock_bus();
        bus.lock().unwrap().write_byte(PSU_STAT, 0xFF).unwrap();
        let left = Psu::new(Arc::downgrade(&bus), PsuSide::Left);
        // Clearing only drops the left enable bit
        left.set_enable(false).unwrap();
        assert_eq!(bus.lock().unwrap().read_byte(PSU_STAT).unwrap(), 0xFE);
        assert!(!left.enabled().unwrap());
        // Setting brings just that bit back
        left.set_enable(true).unwrap();
        assert_eq!(bus.lock().unwrap().read_byte(PSU_STAT).unwrap(), 0xFF);
        assert!(left.enabled().unwrap());
    }
}
