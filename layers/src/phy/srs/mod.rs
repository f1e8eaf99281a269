//! SRS (Sounding Reference Signal) Reception
//! 
//! Tracks the SRS occasions scheduled in each slot and extracts the comb
//! subcarriers they occupy from the frequency-domain receive buffer,
//! according to 3GPP TS 38.211 Section 6.4.1.4

pub mod bandwidth;
pub mod extraction;
pub mod grid;
pub mod receiver;
pub mod registry;

pub use bandwidth::{NrSrsBandwidthTable, SrsBandwidthTable};
pub use extraction::get_srs_signal;
pub use grid::{CombOffsetTable, CombWalk, RxDataF, SrsSignalBuffer};
pub use receiver::SrsReceiver;
pub use registry::{SrsOccasion, SrsRegistry};

use super::frame_structure::FrameParms;
use common::types::Rnti;
use common::utils::NB_SC_PER_RB;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// SRS constants according to 3GPP
pub mod constants {
    /// Default number of SRS occasions tracked concurrently per cell
    pub const NUMBER_OF_NR_SRS_MAX: usize = 16;
    /// Maximum number of SRS antenna ports (1, 2 or 4)
    pub const MAX_SRS_PORTS: usize = 4;
    /// Maximum number of SRS symbols in one occasion (1, 2 or 4)
    pub const MAX_SRS_SYMBOLS: usize = 4;
    /// Largest shift exponent accepted for port, symbol and comb classes
    pub const MAX_SRS_CLASS: u8 = 2;
}

/// Errors raised by SRS registration and extraction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SrsError {
    #[error("SRS list is full ({capacity} occasions), rnti {rnti} frame {frame} slot {slot} dropped")]
    RegistryFull {
        rnti: Rnti,
        frame: u32,
        slot: u8,
        capacity: usize,
    },
    
    #[error("Invalid SRS configuration: {0}")]
    InvalidConfiguration(String),
    
    #[error("Buffer shape mismatch: {0}")]
    BufferShape(String),
    
    #[error("No SRS bandwidth entry for C_SRS {config_index}, B_SRS {bandwidth_index}")]
    UnknownBandwidth {
        config_index: u8,
        bandwidth_index: u8,
    },
    
    #[error("SRS occasion {0} is not active")]
    InactiveOccasion(usize),
}

/// Outcome of a structurally successful extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SrsSignalStatus {
    /// At least one non-zero sample was found on the comb
    Detected,
    /// Every comb sample was zero, the UE most likely did not transmit
    NoSignal,
}

/// SRS PDU as delivered by the MAC for one occasion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SrsPdu {
    /// UE identity
    pub rnti: Rnti,
    /// Opaque handle echoed back in the SRS indication
    #[serde(default)]
    pub handle: u32,
    /// Start of the bandwidth part in resource blocks
    #[serde(default)]
    pub bwp_start: u16,
    /// Number of antenna ports as a shift exponent (0: 1, 1: 2, 2: 4)
    pub num_ant_ports: u8,
    /// Number of symbols as a shift exponent (0: 1, 1: 2, 2: 4)
    pub num_symbols: u8,
    /// Starting position counted back from the last symbol of the slot
    pub time_start_position: u8,
    /// C_SRS
    pub config_index: u8,
    /// B_SRS
    pub bandwidth_index: u8,
    /// Transmission comb as a shift exponent (0: K_TC 2, 1: K_TC 4, 2: K_TC 8)
    pub comb_size: u8,
}

/// Quantities derived from one SRS PDU against the cell frame parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SrsResourceParams {
    /// Number of UE antenna ports (N_ap)
    pub n_ap: usize,
    /// Number of SRS symbols (N_symb^SRS)
    pub n_symb: usize,
    /// Comb spacing in subcarriers (K_TC)
    pub k_tc: usize,
    /// Comb samples per symbol (M_sc,b^SRS)
    pub m_sc: usize,
    /// First SRS symbol within the slot
    pub l0: usize,
    /// Offset of symbol l0 in a receive buffer row
    pub symbol_offset: usize,
    /// FFT bin of the bandwidth part start, already reduced into the FFT
    pub subcarrier_offset: usize,
}

impl SrsResourceParams {
    /// Derive the resource parameters of an occasion received in `slot`
    ///
    /// SRS symbols running past the end of the slot are an error, never a wrap.
    pub fn derive(
        frame_parms: &FrameParms,
        slot: u8,
        pdu: &SrsPdu,
        bandwidth_table: &dyn SrsBandwidthTable,
    ) -> Result<Self, SrsError> {
        if pdu.num_ant_ports > constants::MAX_SRS_CLASS {
            return Err(SrsError::InvalidConfiguration(format!(
                "num_ant_ports {} (only 1, 2 or 4 ports)", pdu.num_ant_ports
            )));
        }
        if pdu.num_symbols > constants::MAX_SRS_CLASS {
            return Err(SrsError::InvalidConfiguration(format!(
                "num_symbols {} (only 1, 2 or 4 symbols)", pdu.num_symbols
            )));
        }
        if pdu.comb_size > constants::MAX_SRS_CLASS {
            return Err(SrsError::InvalidConfiguration(format!(
                "comb_size {} (only K_TC 2, 4 or 8)", pdu.comb_size
            )));
        }
        
        let n_ap = 1usize << pdu.num_ant_ports;
        let n_symb = 1usize << pdu.num_symbols;
        let k_tc = 2usize << pdu.comb_size;
        
        let symbols_per_slot = frame_parms.symbols_per_slot;
        let time_start = pdu.time_start_position as usize;
        if time_start >= symbols_per_slot {
            return Err(SrsError::InvalidConfiguration(format!(
                "time_start_position {} outside a slot of {} symbols", time_start, symbols_per_slot
            )));
        }
        let l0 = symbols_per_slot - 1 - time_start;
        if l0 + n_symb > symbols_per_slot {
            return Err(SrsError::InvalidConfiguration(format!(
                "{} SRS symbols from symbol {} run past the end of the slot", n_symb, l0
            )));
        }
        
        let m_srs = bandwidth_table
            .m_srs(pdu.config_index, pdu.bandwidth_index)
            .ok_or(SrsError::UnknownBandwidth {
                config_index: pdu.config_index,
                bandwidth_index: pdu.bandwidth_index,
            })?;
        let m_sc = m_srs as usize * NB_SC_PER_RB / k_tc;
        
        let ofdm_symbol_size = frame_parms.ofdm_symbol_size;
        if k_tc > ofdm_symbol_size {
            return Err(SrsError::InvalidConfiguration(format!(
                "comb spacing {} exceeds FFT size {}", k_tc, ofdm_symbol_size
            )));
        }
        
        let symbol_offset = frame_parms.symbol_offset(slot, l0);
        let subcarrier_offset = (frame_parms.first_carrier_offset
            + pdu.bwp_start as usize * NB_SC_PER_RB)
            % ofdm_symbol_size;
        
        Ok(Self {
            n_ap,
            n_symb,
            k_tc,
            m_sc,
            l0,
            symbol_offset,
            subcarrier_offset,
        })
    }
    
    /// Number of samples per antenna covered by the occasion
    pub fn span_len(&self, ofdm_symbol_size: usize) -> usize {
        self.n_symb * ofdm_symbol_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phy::frame_structure::CyclicPrefix;
    use common::types::{Bandwidth, SubcarrierSpacing};
    
    fn test_parms() -> FrameParms {
        FrameParms::new(
            SubcarrierSpacing::Scs30,
            CyclicPrefix::Normal,
            Bandwidth::Bw40,
            2048,
            2,
        ).unwrap()
    }
    
    fn test_pdu() -> SrsPdu {
        SrsPdu {
            rnti: Rnti::new(0x4601),
            handle: 0,
            bwp_start: 0,
            num_ant_ports: 1,
            num_symbols: 1,
            time_start_position: 5,
            config_index: 13,
            bandwidth_index: 0,
            comb_size: 0,
        }
    }
    
    #[test]
    fn test_derive_params() {
        let parms = test_parms();
        let params = SrsResourceParams::derive(&parms, 6, &test_pdu(), &NrSrsBandwidthTable).unwrap();
        
        assert_eq!(params.n_ap, 2);
        assert_eq!(params.n_symb, 2);
        assert_eq!(params.k_tc, 2);
        // C_SRS 13, B_SRS 0 occupies 48 RBs
        assert_eq!(params.m_sc, 48 * 12 / 2);
        assert_eq!(params.l0, 8);
        assert_eq!(params.symbol_offset, (2 * 14 + 8) * 2048);
        assert_eq!(params.subcarrier_offset, 1412);
        assert_eq!(params.span_len(2048), 4096);
    }
    
    #[test]
    fn test_subcarrier_offset_wraps_into_fft() {
        let parms = test_parms();
        let pdu = SrsPdu { bwp_start: 60, ..test_pdu() };
        let params = SrsResourceParams::derive(&parms, 0, &pdu, &NrSrsBandwidthTable).unwrap();
        
        assert_eq!(params.subcarrier_offset, 1412 + 720 - 2048);
    }
    
    #[test]
    fn test_comb_spacing() {
        let parms = test_parms();
        let pdu = SrsPdu { comb_size: 1, ..test_pdu() };
        let params = SrsResourceParams::derive(&parms, 0, &pdu, &NrSrsBandwidthTable).unwrap();
        
        assert_eq!(params.k_tc, 4);
        assert_eq!(params.m_sc, 48 * 12 / 4);
    }
    
    #[test]
    fn test_invalid_classes_rejected() {
        let parms = test_parms();
        for pdu in [
            SrsPdu { num_ant_ports: 3, ..test_pdu() },
            SrsPdu { num_symbols: 3, ..test_pdu() },
            SrsPdu { comb_size: 3, ..test_pdu() },
        ] {
            let result = SrsResourceParams::derive(&parms, 0, &pdu, &NrSrsBandwidthTable);
            assert!(matches!(result, Err(SrsError::InvalidConfiguration(_))));
        }
    }
    
    #[test]
    fn test_symbols_past_slot_end_rejected() {
        let parms = test_parms();
        // Four symbols starting on the last symbol of the slot
        let pdu = SrsPdu { num_symbols: 2, time_start_position: 0, ..test_pdu() };
        assert!(SrsResourceParams::derive(&parms, 0, &pdu, &NrSrsBandwidthTable).is_err());
        
        let pdu = SrsPdu { time_start_position: 14, ..test_pdu() };
        assert!(SrsResourceParams::derive(&parms, 0, &pdu, &NrSrsBandwidthTable).is_err());
    }
    
    #[test]
    fn test_unknown_bandwidth_rejected() {
        let parms = test_parms();
        let pdu = SrsPdu { bandwidth_index: 4, ..test_pdu() };
        let result = SrsResourceParams::derive(&parms, 0, &pdu, &NrSrsBandwidthTable);
        assert_eq!(result, Err(SrsError::UnknownBandwidth { config_index: 13, bandwidth_index: 4 }));
    }
}
