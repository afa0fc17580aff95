//! Typed blocks of the SMC register map: LEDs, PSUs, SFP cages, and the
//! peripheral reset lines.

pub mod led;
pub mod psu;
pub mod reset;
pub mod sfp;

use crate::transport::{
    LpcBus,
    TransportResult,
};
use kstring::KString;

/// Whether a signal reads true when its bit is set or when it is clear
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Polarity {
    ActiveHigh,
    ActiveLow,
}

/// IO direction of an attribute-level signal
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    /// Client applications can only observe signals of this kind
    ReadOnly,
    /// Client applications can also drive signals of this kind
    ReadWrite,
}

/// One observable or settable boolean in the register map
#[derive(Debug, Clone)]
pub struct Signal {
    /// Attribute-style name, e.g. `sfp3_txdis`
    pub name: KString,
    /// Register holding the bit
    pub addr: u16,
    /// Bit index within the register
    pub bit: u8,
    pub polarity: Polarity,
    pub direction: Direction,
}

/// The declarative table of every single-bit signal the attribute surface
/// exposes. An attribute layer is one loop over this table instead of a
/// hand-written accessor per port per signal type.
#[must_use]
pub fn signals() -> Vec<Signal> {
    let mut table: Vec<Signal> = [
        ("psuL_prs", psu::PSUL_PRS, Direction::ReadOnly),
        ("psuR_prs", psu::PSUR_PRS, Direction::ReadOnly),
        ("psuL_pwok", psu::PSUL_PWOK, Direction::ReadOnly),
        ("psuR_pwok", psu::PSUR_PWOK, Direction::ReadOnly),
        ("psuL_alert", psu::PSUL_ALERT, Direction::ReadOnly),
        ("psuR_alert", psu::PSUR_ALERT, Direction::ReadOnly),
        ("psuL_enb", psu::PSUL_ENB, Direction::ReadWrite),
        ("psuR_enb", psu::PSUR_ENB, Direction::ReadWrite),
    ]
    .into_iter()
    .map(|(name, bit, direction)| Signal {
        name: name.into(),
        addr: psu::PSU_STAT,
        bit,
        polarity: Polarity::ActiveHigh,
        direction,
    })
    .collect();

    let per_port = [
        ("txfault", sfp::SFP_TXFAULT, Direction::ReadOnly),
        ("rxlos", sfp::SFP_RXLOS, Direction::ReadOnly),
        ("modabs", sfp::SFP_MODABS, Direction::ReadOnly),
        ("txdis", sfp::SFP_TXDIS, Direction::ReadWrite),
    ];
    for port in 1..=sfp::PORT_COUNT {
        for (kind, addr, direction) in per_port {
            table.push(Signal {
                name: KString::from_string(format!("sfp{port}_{kind}")),
                addr,
                bit: port - 1,
                polarity: Polarity::ActiveHigh,
                direction,
            });
        }
    }
    table
}

/// Read one signal bit from a bus the caller has already locked
pub(crate) fn read_bit<T>(
    bus: &mut T,
    addr: u16,
    bit: u8,
    polarity: Polarity,
) -> TransportResult<bool>
where
    T: LpcBus,
{
    let raw = (bus.read_byte(addr)? >> bit) & 1 == 1;
    Ok(match polarity {
        Polarity::ActiveHigh => raw,
        Polarity::ActiveLow => !raw,
    })
}

/// Set or clear one signal bit with a read-modify-write, leaving the other
/// seven bits of the register untouched. The caller must hold the bus lock
/// across this whole call so the read and the write can't be split up.
pub(crate) fn write_bit<T>(
    bus: &mut T,
    addr: u16,
    bit: u8,
    polarity: Polarity,
    on: bool,
) -> TransportResult<()>
where
    T: LpcBus,
{
    let set = match polarity {
        Polarity::ActiveHigh => on,
        Polarity::ActiveLow => !on,
    };
    let data = bus.read_byte(addr)?;
    let data = if set {
        data | (1 << bit)
    } else {
        data & !(1 << bit)
    };
    bus.write_byte(addr, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::register_map,
        transport::mock::Mock,
    };
    use std::collections::HashSet;

    #[test]
    fn test_signal_table_shape() {
        let table = signals();
        // 8 PSU signals plus 4 signal types across 8 ports
        assert_eq!(table.len(), 40);
        let names: HashSet<_> = table.iter().map(|s| s.name.clone()).collect();
        assert_eq!(names.len(), table.len());
        let map = register_map();
        for sig in &table {
            assert!(sig.bit < 8);
            assert!(
                map.values().any(|reg| reg.addr == sig.addr),
                "{} points at an unmapped register",
                sig.name
            );
        }
    }

    #[test]
    fn test_bit_isolation() {
        let mut bus = Mock::new(register_map());
        let addr = crate::core::SCRATCH;
        for bit in 0..8 {
            for polarity in [Polarity::ActiveHigh, Polarity::ActiveLow] {
                let seed = 0xA5u8;
                bus.write_byte(addr, seed).unwrap();
                write_bit(&mut bus, addr, bit, polarity, true).unwrap();
                let expected = match polarity {
                    Polarity::ActiveHigh => seed | (1 << bit),
                    Polarity::ActiveLow => seed & !(1 << bit),
                };
                assert_eq!(bus.read_byte(addr).unwrap(), expected);

                bus.write_byte(addr, seed).unwrap();
                write_bit(&mut bus, addr, bit, polarity, false).unwrap();
                let expected = match polarity {
                    Polarity::ActiveHigh => seed & !(1 << bit),
                    Polarity::ActiveLow => seed | (1 << bit),
                };
                assert_eq!(bus.read_byte(addr).unwrap(), expected);
            }
        }
    }

    #[test]
    fn test_read_bit_polarity() {
        let mut bus = Mock::new(register_map());
        let addr = crate::core::SCRATCH;
        bus.write_byte(addr, 0b0000_0100).unwrap();
        assert!(read_bit(&mut bus, addr, 2, Polarity::ActiveHigh).unwrap());
        assert!(!read_bit(&mut bus, addr, 2, Polarity::ActiveLow).unwrap());
        assert!(!read_bit(&mut bus, addr, 3, Polarity::ActiveHigh).unwrap());
        assert!(read_bit(&mut bus, addr, 3, Polarity::ActiveLow).unwrap());
    }
}
