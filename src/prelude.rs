//! Prelude (helpful reexports) for this package

pub use crate::{
    blocks::{
        led::{
            FanIndex,
            FanLedState,
            LedState,
            PanelLedState,
        },
        psu::PsuSide,
        reset::ResetLine,
        sfp::PortIndex,
    },
    core::Smc,
    transport::{
        devport::DevPort,
        mock::Mock,
        LpcBus,
    },
};
