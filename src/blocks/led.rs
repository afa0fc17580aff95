//! The front-panel LED blocks and their register codecs.
//!
//! Three layouts exist on this CPLD. The status LED packs a 2-bit color
//! select (bits 5:4) and a 2-bit blink control (bits 1:0) into one byte.
//! The alarm and power LEDs use a plain 2-bit tri-state field in bits 1:0.
//! The fan tray LEDs use a 3-bit five-state field in bits 2:0.
//!
//! Decoding is total: any bit pattern without a name reads back as "off",
//! which is what the hardware's sysfs surface always did. Encoding is total
//! over the named states; it's the textual vocabulary that rejects unknown
//! input.

use crate::transport::LpcBus;
use packed_struct::prelude::*;
use std::{
    fmt,
    str::FromStr,
    sync::{
        Mutex,
        Weak,
    },
};
use thiserror::Error;

/// Fan tray LED registers, one per tray
pub(crate) const FAN_LED_1: u16 = 0xA133;
pub(crate) const FAN_LED_2: u16 = 0xA137;
pub(crate) const FAN_LED_3: u16 = 0xA13B;

/// Power LED register, 2-bit tri-state layout
pub(crate) const LED_PWR: u16 = 0xA142;
/// Status LED register, color-select + blink-control layout
pub(crate) const LED_SYS: u16 = 0xA143;
/// Alarm LED register, 2-bit tri-state layout
pub(crate) const LED_ALARM: u16 = 0xA144;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] crate::transport::Error),
    #[error("Unknown LED state `{0}`")]
    UnknownState(String),
}

/// The color-select field of the status LED register (bits 5:4)
#[derive(PrimitiveEnum_u8, Debug, Copy, Clone, PartialEq, Eq)]
enum ColorSel {
    /// Both the green and the amber die at once
    Both = 0,
    Amber = 1,
    Green = 2,
    Off = 3,
}

/// The blink-control field of the status LED register (bits 1:0)
#[derive(PrimitiveEnum_u8, Debug, Copy, Clone, PartialEq, Eq)]
enum BlinkCtrl {
    Off = 0,
    Blink1Hz = 1,
    Blink4Hz = 2,
    On = 3,
}

/// Every state the front-panel status LED can be told to show
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LedState {
    Off,
    GreenSolid,
    AmberSolid,
    GreenBlink1Hz,
    AmberBlink1Hz,
    GreenBlink4Hz,
    AmberBlink4Hz,
    GreenAmberBlink1Hz,
    GreenAmberBlink4Hz,
}

impl LedState {
    /// Encode into the status LED register byte
    #[must_use]
    pub fn encode(self) -> u8 {
        let (color, control) = match self {
            LedState::Off => (ColorSel::Off, BlinkCtrl::Off),
            LedState::GreenSolid => (ColorSel::Green, BlinkCtrl::On),
            LedState::AmberSolid => (ColorSel::Amber, BlinkCtrl::On),
            LedState::GreenBlink1Hz => (ColorSel::Green, BlinkCtrl::Blink1Hz),
            LedState::AmberBlink1Hz => (ColorSel::Amber, BlinkCtrl::Blink1Hz),
            LedState::GreenBlink4Hz => (ColorSel::Green, BlinkCtrl::Blink4Hz),
            LedState::AmberBlink4Hz => (ColorSel::Amber, BlinkCtrl::Blink4Hz),
            LedState::GreenAmberBlink1Hz => (ColorSel::Both, BlinkCtrl::Blink1Hz),
            LedState::GreenAmberBlink4Hz => (ColorSel::Both, BlinkCtrl::Blink4Hz),
        };
        (color.to_primitive() << 4) | control.to_primitive()
    }

    /// Decode a status LED register byte. Patterns outside the named table
    /// (every color with the blink control off, and both dies solid on)
    /// read as [`LedState::Off`]; bits 7:6 and 3:2 are reserved and
    /// ignored.
    #[must_use]
    pub fn decode(byte: u8) -> Self {
        let color = ColorSel::from_primitive((byte >> 4) & 0x3).unwrap_or(ColorSel::Off);
        let control = BlinkCtrl::from_primitive(byte & 0x3).unwrap_or(BlinkCtrl::Off);
        match (color, control) {
            (ColorSel::Green, BlinkCtrl::On) => LedState::GreenSolid,
            (ColorSel::Green, BlinkCtrl::Blink1Hz) => LedState::GreenBlink1Hz,
            (ColorSel::Green, BlinkCtrl::Blink4Hz) => LedState::GreenBlink4Hz,
            (ColorSel::Amber, BlinkCtrl::On) => LedState::AmberSolid,
            (ColorSel::Amber, BlinkCtrl::Blink1Hz) => LedState::AmberBlink1Hz,
            (ColorSel::Amber, BlinkCtrl::Blink4Hz) => LedState::AmberBlink4Hz,
            (ColorSel::Both, BlinkCtrl::Blink1Hz) => LedState::GreenAmberBlink1Hz,
            (ColorSel::Both, BlinkCtrl::Blink4Hz) => LedState::GreenAmberBlink4Hz,
            _ => LedState::Off,
        }
    }

    /// The attribute-file token for this state
    #[must_use]
    pub fn as_token(self) -> &'static str {
        match self {
            LedState::Off => "off",
            LedState::GreenSolid => "green",
            LedState::AmberSolid => "amber",
            LedState::GreenBlink1Hz => "grn_bnk_1hz",
            LedState::AmberBlink1Hz => "amb_bnk_1hz",
            LedState::GreenBlink4Hz => "grn_bnk_4hz",
            LedState::AmberBlink4Hz => "amb_bnk_4hz",
            LedState::GreenAmberBlink1Hz => "grn_amb_1hz",
            LedState::GreenAmberBlink4Hz => "grn_amb_4hz",
        }
    }
}

impl fmt::Display for LedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

impl FromStr for LedState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "off" => LedState::Off,
            "green" => LedState::GreenSolid,
            "amber" => LedState::AmberSolid,
            "grn_bnk_1hz" => LedState::GreenBlink1Hz,
            "amb_bnk_1hz" => LedState::AmberBlink1Hz,
            "grn_bnk_4hz" => LedState::GreenBlink4Hz,
            "amb_bnk_4hz" => LedState::AmberBlink4Hz,
            "grn_amb_1hz" => LedState::GreenAmberBlink1Hz,
            "grn_amb_4hz" => LedState::GreenAmberBlink4Hz,
            other => return Err(Error::UnknownState(other.to_string())),
        })
    }
}

/// The three states of the alarm and power LEDs. Register value 3 is
/// reserved and decodes as `Off`.
#[derive(PrimitiveEnum_u8, Debug, Copy, Clone, PartialEq, Eq)]
pub enum PanelLedState {
    Off = 0,
    Green = 1,
    Amber = 2,
}

impl PanelLedState {
    #[must_use]
    pub fn decode(byte: u8) -> Self {
        Self::from_primitive(byte & 0x3).unwrap_or(Self::Off)
    }
}

impl fmt::Display for PanelLedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PanelLedState::Off => "off",
            PanelLedState::Green => "green",
            PanelLedState::Amber => "amber",
        })
    }
}

impl FromStr for PanelLedState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "off" => PanelLedState::Off,
            "green" => PanelLedState::Green,
            "amber" => PanelLedState::Amber,
            other => return Err(Error::UnknownState(other.to_string())),
        })
    }
}

/// The five states of a fan tray LED. Register values 5..7 are reserved
/// and decode as `Off`.
#[derive(PrimitiveEnum_u8, Debug, Copy, Clone, PartialEq, Eq)]
pub enum FanLedState {
    Green = 0,
    GreenBlink = 1,
    Amber = 2,
    AmberBlink = 3,
    Off = 4,
}

impl FanLedState {
    #[must_use]
    pub fn decode(byte: u8) -> Self {
        Self::from_primitive(byte & 0x7).unwrap_or(Self::Off)
    }
}

impl fmt::Display for FanLedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FanLedState::Green => "green",
            FanLedState::GreenBlink => "green-blink",
            FanLedState::Amber => "amber",
            FanLedState::AmberBlink => "amber-blink",
            FanLedState::Off => "off",
        })
    }
}

impl FromStr for FanLedState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "green" => FanLedState::Green,
            "green-blink" => FanLedState::GreenBlink,
            "amber" => FanLedState::Amber,
            "amber-blink" => FanLedState::AmberBlink,
            "off" => FanLedState::Off,
            other => return Err(Error::UnknownState(other.to_string())),
        })
    }
}

/// The front-panel status LED
#[derive(Debug)]
pub struct StatusLed<T> {
    /// Upwards pointer to the parent device's bus
    transport: Weak<Mutex<T>>,
}

impl<T> StatusLed<T>
where
    T: LpcBus,
{
    #[must_use]
    pub(crate) fn new(transport: Weak<Mutex<T>>) -> Self {
        Self { transport }
    }

    /// Current state of the LED
    /// # Errors
    /// Returns an error on bad transport
    #[allow(clippy::missing_panics_doc)]
    pub fn get(&self) -> Result<LedState, Error> {
        let tarc = self.transport.upgrade().unwrap();
        let mut bus = (*tarc).lock().unwrap();
        Ok(LedState::decode(bus.read_byte(LED_SYS)?))
    }

    /// Drive the LED, writing the full encoded byte
    /// # Errors
    /// Returns an error on bad transport
    #[allow(clippy::missing_panics_doc)]
    pub fn set(&self, state: LedState) -> Result<(), Error> {
        let tarc = self.transport.upgrade().unwrap();
        let mut bus = (*tarc).lock().unwrap();
        Ok(bus.write_byte(LED_SYS, state.encode())?)
    }
}

/// An alarm or power front-panel LED, both with the plain tri-state layout
#[derive(Debug)]
pub struct PanelLed<T> {
    /// Upwards pointer to the parent device's bus
    transport: Weak<Mutex<T>>,
    addr: u16,
}

impl<T> PanelLed<T>
where
    T: LpcBus,
{
    #[must_use]
    pub(crate) fn alarm(transport: Weak<Mutex<T>>) -> Self {
        Self {
            transport,
            addr: LED_ALARM,
        }
    }

    #[must_use]
    pub(crate) fn power(transport: Weak<Mutex<T>>) -> Self {
        Self {
            transport,
            addr: LED_PWR,
        }
    }

    /// Current state of the LED
    /// # Errors
    /// Returns an error on bad transport
    #[allow(clippy::missing_panics_doc)]
    pub fn get(&self) -> Result<PanelLedState, Error> {
        let tarc = self.transport.upgrade().unwrap();
        let mut bus = (*tarc).lock().unwrap();
        Ok(PanelLedState::decode(bus.read_byte(self.addr)?))
    }

    /// Drive the LED with a read-modify-write that preserves bits 7:2
    /// # Errors
    /// Returns an error on bad transport
    #[allow(clippy::missing_panics_doc)]
    pub fn set(&self, state: PanelLedState) -> Result<(), Error> {
        let tarc = self.transport.upgrade().unwrap();
        let mut bus = (*tarc).lock().unwrap();
        let data = bus.read_byte(self.addr)?;
        let data = (data & !0x3) | state.to_primitive();
        Ok(bus.write_byte(self.addr, data)?)
    }
}

/// Which fan tray LED a [`FanLed`] block drives
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FanIndex {
    Fan1,
    Fan2,
    Fan3,
}

impl FanIndex {
    fn register(self) -> u16 {
        match self {
            FanIndex::Fan1 => FAN_LED_1,
            FanIndex::Fan2 => FAN_LED_2,
            FanIndex::Fan3 => FAN_LED_3,
        }
    }
}

/// One fan tray's LED
#[derive(Debug)]
pub struct FanLed<T> {
    /// Upwards pointer to the parent device's bus
    transport: Weak<Mutex<T>>,
    addr: u16,
}

impl<T> FanLed<T>
where
    T: LpcBus,
{
    #[must_use]
    pub(crate) fn new(transport: Weak<Mutex<T>>, fan: FanIndex) -> Self {
        Self {
            transport,
            addr: fan.register(),
        }
    }

    /// Current state of the LED
    /// # Errors
    /// Returns an error on bad transport
    #[allow(clippy::missing_panics_doc)]
    pub fn get(&self) -> Result<FanLedState, Error> {
        let tarc = self.transport.upgrade().unwrap();
        let mut bus = (*tarc).lock().unwrap();
        Ok(FanLedState::decode(bus.read_byte(self.addr)?))
    }

    /// Drive the LED
    /// # Errors
    /// Returns an error on bad transport
    #[allow(clippy::missing_panics_doc)]
    pub fn set(&self, state: FanLedState) -> Result<(), Error> {
        let tarc = self.transport.upgrade().unwrap();
        let mut bus = (*tarc).lock().unwrap();
        Ok(bus.write_byte(self.addr, state.to_primitive())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::register_map,
        transport::mock::Mock,
    };
    use std::{
        collections::HashMap,
        sync::Arc,
    };

    const ALL_STATES: [LedState; 9] = [
        LedState::Off,
        LedState::GreenSolid,
        LedState::AmberSolid,
        LedState::GreenBlink1Hz,
        LedState::AmberBlink1Hz,
        LedState::GreenBlink4Hz,
        LedState::AmberBlink4Hz,
        LedState::GreenAmberBlink1Hz,
        LedState::GreenAmberBlink4Hz,
    ];

    fn mock_bus() -> Arc<Mutex<Mock>> {
        Arc::new(Mutex::new(Mock::new(register_map())))
    }

    #[test]
    fn test_status_roundtrip() {
        for state in ALL_STATES {
            assert_eq!(LedState::decode(state.encode()), state);
        }
    }

    #[test]
    fn test_status_encoding_matches_hardware() {
        assert_eq!(LedState::Off.encode(), 0x30);
        assert_eq!(LedState::GreenSolid.encode(), 0x23);
        assert_eq!(LedState::AmberSolid.encode(), 0x13);
        assert_eq!(LedState::GreenBlink1Hz.encode(), 0x21);
        assert_eq!(LedState::AmberBlink1Hz.encode(), 0x11);
        assert_eq!(LedState::GreenBlink4Hz.encode(), 0x22);
        assert_eq!(LedState::AmberBlink4Hz.encode(), 0x12);
        assert_eq!(LedState::GreenAmberBlink1Hz.encode(), 0x01);
        assert_eq!(LedState::GreenAmberBlink4Hz.encode(), 0x02);
    }

    #[test]
    fn test_unnamed_patterns_decode_off() {
        // The reserved bits 7:6 and 3:2 never matter, and any (color,
        // control) pair outside the named table reads as Off
        let named: HashMap<u8, LedState> =
            ALL_STATES.iter().map(|s| (s.encode(), *s)).collect();
        for byte in 0..=0xFFu8 {
            let expected = match named.get(&(byte & 0x33)) {
                Some(state) => *state,
                None => LedState::Off,
            };
            assert_eq!(LedState::decode(byte), expected, "byte {byte:#04x}");
        }
    }

    #[test]
    fn test_status_tokens() {
        for state in ALL_STATES {
            assert_eq!(state.as_token().parse::<LedState>().unwrap(), state);
        }
        assert_eq!("grn_amb_4hz".parse::<LedState>().unwrap(), LedState::GreenAmberBlink4Hz);
        assert!("blink".parse::<LedState>().is_err());
        assert!("".parse::<LedState>().is_err());
    }

    #[test]
    fn test_status_led_block() {
        let bus = mock_bus();
        let led = StatusLed::new(Arc::downgrade(&bus));
        led.set(LedState::AmberBlink4Hz).unwrap();
        assert_eq!(led.get().unwrap(), LedState::AmberBlink4Hz);
        assert_eq!(
            bus.lock().unwrap().read_byte(LED_SYS).unwrap(),
            0x12
        );
    }

    #[test]
    fn test_panel_led_preserves_high_bits() {
        let bus = mock_bus();
        bus.lock().unwrap().write_byte(LED_ALARM, 0xF0).unwrap();
        let led = PanelLed::alarm(Arc::downgrade(&bus));
        led.set(PanelLedState::Green).unwrap();
        assert_eq!(bus.lock().unwrap().read_byte(LED_ALARM).unwrap(), 0xF1);
        assert_eq!(led.get().unwrap(), PanelLedState::Green);
    }

    #[test]
    fn test_panel_reserved_decodes_off() {
        assert_eq!(PanelLedState::decode(0x3), PanelLedState::Off);
        assert_eq!(PanelLedState::decode(0xFF), PanelLedState::Off);
        assert_eq!(PanelLedState::decode(0xF2), PanelLedState::Amber);
    }

    #[test]
    fn test_power_led_has_its_own_register() {
        let bus = mock_bus();
        let power = PanelLed::power(Arc::downgrade(&bus));
        power.set(PanelLedState::Amber).unwrap();
        let mut guard = bus.lock().unwrap();
        assert_eq!(guard.read_byte(LED_PWR).unwrap(), 0x02);
        assert_eq!(guard.read_byte(LED_ALARM).unwrap(), 0x00);
    }

    #[test]
    fn test_fan_led() {
        let bus = mock_bus();
        let led = FanLed::new(Arc::downgrade(&bus), FanIndex::Fan2);
        led.set(FanLedState::AmberBlink).unwrap();
        assert_eq!(bus.lock().unwrap().read_byte(FAN_LED_2).unwrap(), 0x03);
        assert_eq!(led.get().unwrap(), FanLedState::AmberBlink);
    }

    #[test]
    fn test_fan_led_codec() {
        for state in [
            FanLedState::Green,
            FanLedState::GreenBlink,
            FanLedState::Amber,
            FanLedState::AmberBlink,
            FanLedState::Off,
        ] {
            assert_eq!(FanLedState::decode(state.to_primitive()), state);
            assert_eq!(state.to_string().parse::<FanLedState>().unwrap(), state);
        }
        assert_eq!(FanLedState::decode(5), FanLedState::Off);
        assert_eq!(FanLedState::decode(7), FanLedState::Off);
        assert!("orange".parse::<FanLedState>().is_err());
    }
}
