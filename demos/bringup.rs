//! In this example, we will attach to the SMC over `/dev/port`, release the
//! peripheral resets, report board status, and exercise the front-panel
//! LEDs. Needs root (or CAP_SYS_RAWIO).

use smc_cpld::{
    blocks::signals,
    core::format_byte,
    prelude::*,
};
use std::{
    thread,
    time::Duration,
};

fn main() -> anyhow::Result<()> {
    let smc = Smc::new(DevPort::open()?);

    smc.deassert_resets()?;
    println!("CPLD revision {}", format_byte(smc.version()?));

    for side in [PsuSide::Left, PsuSide::Right] {
        let psu = smc.psu(side);
        println!(
            "PSU {side:?}: present={} power_ok={} enabled={} alert={}",
            u8::from(psu.present()?),
            u8::from(psu.power_ok()?),
            u8::from(psu.enabled()?),
            u8::from(psu.alert()?),
        );
    }

    for port in 1..=8 {
        let sfp = smc.sfp(PortIndex::new(port)?);
        println!(
            "SFP {port}: modabs={} txfault={} rxlos={} txdis={}",
            u8::from(sfp.mod_absent()?),
            u8::from(sfp.tx_fault()?),
            u8::from(sfp.rx_los()?),
            u8::from(sfp.tx_disable()?),
        );
    }

    // Walk the status LED through a few states and put it back
    let status = smc.status_led();
    let previous = status.get()?;
    for token in ["green", "amber", "grn_amb_1hz"] {
        status.set(token.parse::<LedState>()?)?;
        thread::sleep(Duration::from_secs(1));
    }
    status.set(previous)?;

    // Dump every single-bit signal an attribute surface would expose
    for sig in signals() {
        smc.select_read_addr(sig.addr);
        let byte = smc.read_selected()?;
        println!("{}: {}", sig.name, (byte >> sig.bit) & 1);
    }

    Ok(())
}
