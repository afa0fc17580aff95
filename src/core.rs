//! The core types and functions for talking to the SMC management CPLD

use crate::{
    blocks::{
        led::{
            FanIndex,
            FanLed,
            PanelLed,
            StatusLed,
        },
        psu::{
            Psu,
            PsuSide,
            PsuStatus,
            PSU_STAT,
        },
        reset::{
            ResetControl,
            SPR_RESET,
        },
        sfp::{
            PortIndex,
            SfpPort,
        },
    },
    transport::{
        LpcBus,
        TransportResult,
    },
};
use kstring::KString;
use std::{
    collections::HashMap,
    sync::{
        Arc,
        Mutex,
        Weak,
    },
};
use thiserror::Error;
use tracing::info;

/// CPLD revision register
pub const VERSION: u16 = 0xA100;
/// Scratchpad register, free for software use
pub const SCRATCH: u16 = 0xA101;

/// The representation of one CPLD register
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Register {
    /// I/O-port address of this register
    pub addr: u16,
    /// Number of bytes stored at this location
    pub length: u16,
}

/// The mapping from register names to their location
pub type RegisterMap = HashMap<KString, Register>;

/// Every register this driver knows about, keyed by conventional name.
/// This is what seeds the mock register file in tests.
#[must_use]
pub fn register_map() -> RegisterMap {
    use crate::blocks::{
        led,
        reset,
        sfp,
    };
    [
        ("version", VERSION),
        ("scratch", SCRATCH),
        ("spr_reset", SPR_RESET),
        ("asic_reset", reset::ASIC_RESET),
        ("fan_led1", led::FAN_LED_1),
        ("fan_led2", led::FAN_LED_2),
        ("fan_led3", led::FAN_LED_3),
        ("psu_stat", PSU_STAT),
        ("led_pwr", led::LED_PWR),
        ("led_sys", led::LED_SYS),
        ("led_alarm", led::LED_ALARM),
        ("sfp_txfault", sfp::SFP_TXFAULT),
        ("sfp_rxlos", sfp::SFP_RXLOS),
        ("sfp_modabs", sfp::SFP_MODABS),
        ("sfp_txdis", sfp::SFP_TXDIS),
    ]
    .into_iter()
    .map(|(name, addr)| (name.into(), Register { addr, length: 1 }))
    .collect()
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] crate::transport::Error),
    #[error("Malformed hex token `{0}`")]
    BadHex(String),
    #[error("Expected `<addr> <value>` hex pair, got `{0}`")]
    BadRegisterPair(String),
    #[error("Flag must be `0` or `1`, got `{0}`")]
    BadFlag(String),
}

/// Parse a hex token the way the attribute store hooks do: optional `0x`
/// prefix, base 16, trailing whitespace tolerated
/// # Errors
/// Returns [`Error::BadHex`] when no valid hex digits are present
pub fn parse_hex_u16(token: &str) -> Result<u16, Error> {
    let t = token.trim();
    let digits = t
        .strip_prefix("0x")
        .or_else(|| t.strip_prefix("0X"))
        .unwrap_or(t);
    u16::from_str_radix(digits, 16).map_err(|_| Error::BadHex(t.to_string()))
}

/// Parse a single register byte from hex text
/// # Errors
/// Returns [`Error::BadHex`] when the token isn't a byte-sized hex value
pub fn parse_hex_byte(token: &str) -> Result<u8, Error> {
    let t = token.trim();
    let digits = t
        .strip_prefix("0x")
        .or_else(|| t.strip_prefix("0X"))
        .unwrap_or(t);
    u8::from_str_radix(digits, 16).map_err(|_| Error::BadHex(t.to_string()))
}

/// Parse a `setreg`-style pair of whitespace-separated hex tokens: address,
/// then value. Trailing tokens are ignored, matching the original sysfs
/// surface.
/// # Errors
/// Returns an error when either token is missing or malformed
pub fn parse_register_pair(input: &str) -> Result<(u16, u8), Error> {
    let mut tokens = input.split_whitespace();
    let addr = tokens
        .next()
        .ok_or_else(|| Error::BadRegisterPair(input.trim().to_string()))?;
    let value = tokens
        .next()
        .ok_or_else(|| Error::BadRegisterPair(input.trim().to_string()))?;
    Ok((parse_hex_u16(addr)?, parse_hex_byte(value)?))
}

/// Parse a boolean attribute flag; only `0` and `1` are accepted
/// # Errors
/// Returns [`Error::BadFlag`] on anything else
pub fn parse_flag(token: &str) -> Result<bool, Error> {
    match token.trim() {
        "0" => Ok(false),
        "1" => Ok(true),
        other => Err(Error::BadFlag(other.to_string())),
    }
}

/// Format a register byte the way the attribute files show one
#[must_use]
pub fn format_byte(value: u8) -> String {
    format!("0x{value:02x}")
}

/// The SMC device: every block of the CPLD behind one guarded bus.
///
/// The bus mutex is the register access guard. Every transaction a block
/// performs, including the read-modify-write pairs the bit-field registers
/// need, holds the lock for its whole duration, so concurrent callers on
/// other threads can't interleave in the middle of an update.
#[derive(Debug)]
pub struct Smc<T> {
    /// The guarded bus; blocks hold weak pointers into this
    pub transport: Arc<Mutex<T>>,
    /// Address the next [`Smc::read_selected`] call will read
    read_addr: Mutex<u16>,
}

impl<T> Smc<T>
where
    T: LpcBus,
{
    /// Stand up the device on `bus`. The read-address selector starts at
    /// the version register.
    #[must_use]
    pub fn new(bus: T) -> Self {
        Self {
            transport: Arc::new(Mutex::new(bus)),
            read_addr: Mutex::new(VERSION),
        }
    }

    fn bus(&self) -> Weak<Mutex<T>> {
        Arc::downgrade(&self.transport)
    }

    /// CPLD revision byte
    /// # Errors
    /// Returns an error on bad transport
    #[allow(clippy::missing_panics_doc)]
    pub fn version(&self) -> TransportResult<u8> {
        let mut bus = self.transport.lock().unwrap();
        bus.read_byte(VERSION)
    }

    /// Current scratchpad byte
    /// # Errors
    /// Returns an error on bad transport
    #[allow(clippy::missing_panics_doc)]
    pub fn scratch(&self) -> TransportResult<u8> {
        let mut bus = self.transport.lock().unwrap();
        bus.read_byte(SCRATCH)
    }

    /// Store an arbitrary byte in the scratchpad
    /// # Errors
    /// Returns an error on bad transport
    #[allow(clippy::missing_panics_doc)]
    pub fn set_scratch(&self, value: u8) -> TransportResult<()> {
        let mut bus = self.transport.lock().unwrap();
        bus.write_byte(SCRATCH, value)
    }

    /// Point the read-address selector at `addr` (the `getreg` store side)
    #[allow(clippy::missing_panics_doc)]
    pub fn select_read_addr(&self, addr: u16) {
        *self.read_addr.lock().unwrap() = addr;
    }

    /// Read back the register the selector points at (the `getreg` show
    /// side)
    /// # Errors
    /// Returns an error on bad transport
    #[allow(clippy::missing_panics_doc)]
    pub fn read_selected(&self) -> TransportResult<u8> {
        let addr = *self.read_addr.lock().unwrap();
        let mut bus = self.transport.lock().unwrap();
        bus.read_byte(addr)
    }

    /// Write `value` to an arbitrary register (the `setreg` surface)
    /// # Errors
    /// Returns an error on bad transport
    #[allow(clippy::missing_panics_doc)]
    pub fn poke(&self, addr: u16, value: u8) -> TransportResult<()> {
        let mut bus = self.transport.lock().unwrap();
        bus.write_byte(addr, value)
    }

    /// Snapshot of the whole PSU status register decoded field-by-field
    /// # Errors
    /// Returns an error on bad transport
    #[allow(clippy::missing_panics_doc)]
    pub fn psu_status(&self) -> TransportResult<PsuStatus> {
        let mut bus = self.transport.lock().unwrap();
        Ok(PsuStatus::decode(bus.read_byte(PSU_STAT)?))
    }

    /// Release every peripheral reset line at once, as board bringup does
    /// # Errors
    /// Returns an error on bad transport
    #[allow(clippy::missing_panics_doc)]
    pub fn deassert_resets(&self) -> TransportResult<()> {
        let mut bus = self.transport.lock().unwrap();
        bus.write_byte(SPR_RESET, 0xFF)?;
        info!("released all peripheral reset lines");
        Ok(())
    }

    /// The front-panel status LED
    #[must_use]
    pub fn status_led(&self) -> StatusLed<T> {
        StatusLed::new(self.bus())
    }

    /// The front-panel alarm LED
    #[must_use]
    pub fn alarm_led(&self) -> PanelLed<T> {
        PanelLed::alarm(self.bus())
    }

    /// The front-panel power LED
    #[must_use]
    pub fn power_led(&self) -> PanelLed<T> {
        PanelLed::power(self.bus())
    }

    /// One fan tray's LED
    #[must_use]
    pub fn fan_led(&self, fan: FanIndex) -> FanLed<T> {
        FanLed::new(self.bus(), fan)
    }

    /// One power supply's signals
    #[must_use]
    pub fn psu(&self, side: PsuSide) -> Psu<T> {
        Psu::new(self.bus(), side)
    }

    /// One SFP cage's signals
    #[must_use]
    pub fn sfp(&self, port: PortIndex) -> SfpPort<T> {
        SfpPort::new(self.bus(), port)
    }

    /// The board's reset lines
    #[must_use]
    pub fn resets(&self) -> ResetControl<T> {
        ResetControl::new(self.bus())
    }
}
