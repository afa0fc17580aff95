//! Bus access through `/dev/port`, the character-device view of legacy
//! x86 I/O-port space

use super::{LpcBus, TransportResult};
use std::{
    fs::File,
    os::unix::fs::FileExt,
};
use tracing::{
    info,
    trace,
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("File IO error")]
    Io(#[from] std::io::Error),
}

/// A connection to the CPLD through `/dev/port`.
///
/// Note: opening `/dev/port` needs CAP_SYS_RAWIO, so this usually runs as
/// root
#[derive(Debug)]
pub struct DevPort {
    port: File,
}

impl DevPort {
    /// Open `/dev/port` for register access.
    /// # Errors
    /// Returns an error if the device node can't be opened. That means the
    /// I/O window is unreachable on this machine, which is a fatal
    /// configuration problem rather than something to retry per call.
    pub fn open() -> Result<Self, Error> {
        let port = File::options().read(true).write(true).open("/dev/port")?;
        info!("opened /dev/port for CPLD register access");
        Ok(Self { port })
    }
}

impl LpcBus for DevPort {
    fn read_byte(&mut self, addr: u16) -> TransportResult<u8> {
        let mut byte = [0u8; 1];
        self.port
            .read_exact_at(&mut byte, u64::from(addr))
            .map_err(Error::from)?;
        trace!("inb 0x{addr:04x} -> 0x{:02x}", byte[0]);
        Ok(byte[0])
    }

    fn write_byte(&mut self, addr: u16, value: u8) -> TransportResult<()> {
        self.port
            .write_all_at(&[value], u64::from(addr))
            .map_err(Error::from)?;
        trace!("outb 0x{addr:04x} <- 0x{value:02x}");
        Ok(())
    }
}
