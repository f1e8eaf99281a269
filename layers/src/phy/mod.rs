//! Physical Layer (PHY) Submodules
//! 
//! This module contains the uplink receive processing of the 5G NR physical
//! layer according to 3GPP TS 38.211.

pub mod frame_structure;
pub mod srs;

// Re-export commonly used types
pub use frame_structure::{CyclicPrefix, FrameParms, SlotConfig};
pub use srs::{
    get_srs_signal, CombOffsetTable, CombWalk, NrSrsBandwidthTable, RxDataF, SrsBandwidthTable,
    SrsPdu, SrsReceiver, SrsRegistry, SrsResourceParams, SrsSignalBuffer, SrsSignalStatus,
};
