//! 5G NR Frame Structure Implementation
//! 
//! Numerology and the frequency-domain frame parameters shared by the uplink
//! receive chain, according to 3GPP TS 38.211 and TS 38.104

use crate::LayerError;
use common::types::{Bandwidth, SubcarrierSpacing};
use common::utils::NB_SC_PER_RB;
use std::time::Duration;
use tracing::debug;

/// Number of consecutive slots held by the frequency-domain receive buffer
pub const RX_SLOT_WINDOW: usize = 4;

/// Number of radio frames before the SFN wraps
pub const NB_FRAMES: u32 = 1024;

/// Cyclic prefix type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclicPrefix {
    Normal,
    Extended,
}

/// Slot configuration based on numerology
#[derive(Debug, Clone)]
pub struct SlotConfig {
    /// Number of slots per frame (10ms)
    pub slots_per_frame: u8,
    /// Number of OFDM symbols per slot
    pub symbols_per_slot: u8,
    /// Slot duration in microseconds
    pub slot_duration_us: u32,
}

impl SlotConfig {
    /// Create slot configuration from subcarrier spacing
    pub fn from_scs(scs: SubcarrierSpacing, extended_cp: bool) -> Self {
        let (slots_per_subframe, slot_duration_us) = match scs {
            SubcarrierSpacing::Scs15 => (1, 1000),
            SubcarrierSpacing::Scs30 => (2, 500),
            SubcarrierSpacing::Scs60 => (4, 250),
            SubcarrierSpacing::Scs120 => (8, 125),
            SubcarrierSpacing::Scs240 => (16, 62), // Actually 62.5 us
        };
        
        let symbols_per_slot = if extended_cp { 12 } else { 14 };
        
        Self {
            slots_per_frame: slots_per_subframe * 10,
            symbols_per_slot,
            slot_duration_us,
        }
    }
}

/// Frequency-domain frame parameters of one cell
///
/// Owned by the radio configuration; the receive chain only reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameParms {
    /// Subcarrier spacing
    pub scs: SubcarrierSpacing,
    /// FFT size, i.e. number of subcarrier bins per OFDM symbol
    pub ofdm_symbol_size: usize,
    /// Number of OFDM symbols per slot
    pub symbols_per_slot: usize,
    /// Number of slots per 10ms frame
    pub slots_per_frame: usize,
    /// Number of receive antennas
    pub nb_antennas_rx: usize,
    /// FFT bin of the first subcarrier of the carrier
    pub first_carrier_offset: usize,
    /// Number of uplink resource blocks
    pub num_rbs: usize,
    /// Slot duration in microseconds
    pub slot_duration_us: u32,
}

impl FrameParms {
    /// Derive the frame parameters of a cell
    pub fn new(
        scs: SubcarrierSpacing,
        cyclic_prefix: CyclicPrefix,
        bandwidth: Bandwidth,
        fft_size: usize,
        nb_antennas_rx: usize,
    ) -> Result<Self, LayerError> {
        let num_rbs = calculate_num_rbs(bandwidth, scs)? as usize;
        let num_subcarriers = num_rbs * NB_SC_PER_RB;
        
        if fft_size < num_subcarriers {
            return Err(LayerError::InvalidConfiguration(format!(
                "FFT size {} is smaller than the {} occupied subcarriers",
                fft_size, num_subcarriers
            )));
        }
        
        let slot_config = SlotConfig::from_scs(scs, cyclic_prefix == CyclicPrefix::Extended);
        
        let parms = Self {
            scs,
            ofdm_symbol_size: fft_size,
            symbols_per_slot: slot_config.symbols_per_slot as usize,
            slots_per_frame: slot_config.slots_per_frame as usize,
            nb_antennas_rx,
            // Carrier centred on DC, lower half wraps to the top of the FFT
            first_carrier_offset: fft_size - num_subcarriers / 2,
            num_rbs,
            slot_duration_us: slot_config.slot_duration_us,
        };
        parms.validate()?;
        
        debug!("Frame parameters: {} RBs, FFT {}, first carrier offset {}, {} RX antennas",
               parms.num_rbs, parms.ofdm_symbol_size, parms.first_carrier_offset, parms.nb_antennas_rx);
        
        Ok(parms)
    }
    
    /// Check the invariants the receive chain relies on
    pub fn validate(&self) -> Result<(), LayerError> {
        if self.ofdm_symbol_size == 0 || self.symbols_per_slot == 0 || self.slots_per_frame == 0 {
            return Err(LayerError::InvalidConfiguration(
                "Frame parameters must have a non-zero FFT size, symbol and slot count".to_string()
            ));
        }
        if self.nb_antennas_rx == 0 {
            return Err(LayerError::InvalidConfiguration(
                "At least one receive antenna is required".to_string()
            ));
        }
        if self.first_carrier_offset >= self.ofdm_symbol_size {
            return Err(LayerError::InvalidConfiguration(format!(
                "First carrier offset {} outside FFT of size {}",
                self.first_carrier_offset, self.ofdm_symbol_size
            )));
        }
        Ok(())
    }
    
    /// Samples per antenna in the frequency-domain receive buffer
    pub fn rxdataf_len(&self) -> usize {
        RX_SLOT_WINDOW * self.symbols_per_slot * self.ofdm_symbol_size
    }
    
    /// Offset of a symbol of a slot inside one antenna row of the receive buffer
    pub fn symbol_offset(&self, slot: u8, symbol: usize) -> usize {
        ((slot as usize % RX_SLOT_WINDOW) * self.symbols_per_slot + symbol) * self.ofdm_symbol_size
    }
    
    /// Get slot duration
    pub fn slot_duration(&self) -> Duration {
        Duration::from_micros(self.slot_duration_us as u64)
    }
    
    /// Absolute slot count since SFN 0, wrapping with the SFN
    pub fn absolute_slot(&self, frame: u32, slot: u8) -> u64 {
        (frame % NB_FRAMES) as u64 * self.slots_per_frame as u64 + slot as u64
    }
    
    /// Signed number of slots from `then` to `now`, across the SFN wrap
    ///
    /// Negative when `then` lies ahead of `now`. Distances are folded into
    /// half an SFN period either side of `now`.
    pub fn slot_distance(&self, then: (u32, u8), now: (u32, u8)) -> i64 {
        let period = NB_FRAMES as i64 * self.slots_per_frame as i64;
        let then = self.absolute_slot(then.0, then.1) as i64;
        let now = self.absolute_slot(now.0, now.1) as i64;
        let forward = (now - then).rem_euclid(period);
        if forward > period / 2 {
            forward - period
        } else {
            forward
        }
    }
}

/// Number of RBs based on 3GPP TS 38.104 Table 5.3.2-1
pub fn calculate_num_rbs(bandwidth: Bandwidth, scs: SubcarrierSpacing) -> Result<u16, LayerError> {
    let num_rbs = match (bandwidth, scs) {
        (Bandwidth::Bw5, SubcarrierSpacing::Scs15) => 25,
        (Bandwidth::Bw5, SubcarrierSpacing::Scs30) => 11,
        (Bandwidth::Bw10, SubcarrierSpacing::Scs15) => 52,
        (Bandwidth::Bw10, SubcarrierSpacing::Scs30) => 24,
        (Bandwidth::Bw10, SubcarrierSpacing::Scs60) => 11,
        (Bandwidth::Bw15, SubcarrierSpacing::Scs15) => 79,
        (Bandwidth::Bw15, SubcarrierSpacing::Scs30) => 38,
        (Bandwidth::Bw15, SubcarrierSpacing::Scs60) => 18,
        (Bandwidth::Bw20, SubcarrierSpacing::Scs15) => 106,
        (Bandwidth::Bw20, SubcarrierSpacing::Scs30) => 51,
        (Bandwidth::Bw20, SubcarrierSpacing::Scs60) => 24,
        (Bandwidth::Bw25, SubcarrierSpacing::Scs15) => 133,
        (Bandwidth::Bw25, SubcarrierSpacing::Scs30) => 65,
        (Bandwidth::Bw25, SubcarrierSpacing::Scs60) => 31,
        (Bandwidth::Bw30, SubcarrierSpacing::Scs15) => 160,
        (Bandwidth::Bw30, SubcarrierSpacing::Scs30) => 78,
        (Bandwidth::Bw30, SubcarrierSpacing::Scs60) => 38,
        (Bandwidth::Bw40, SubcarrierSpacing::Scs15) => 216,
        (Bandwidth::Bw40, SubcarrierSpacing::Scs30) => 106,
        (Bandwidth::Bw40, SubcarrierSpacing::Scs60) => 51,
        (Bandwidth::Bw50, SubcarrierSpacing::Scs15) => 270,
        (Bandwidth::Bw50, SubcarrierSpacing::Scs30) => 133,
        (Bandwidth::Bw50, SubcarrierSpacing::Scs60) => 65,
        (Bandwidth::Bw50, SubcarrierSpacing::Scs120) => 31,
        (Bandwidth::Bw60, SubcarrierSpacing::Scs30) => 162,
        (Bandwidth::Bw60, SubcarrierSpacing::Scs60) => 79,
        (Bandwidth::Bw60, SubcarrierSpacing::Scs120) => 38,
        (Bandwidth::Bw80, SubcarrierSpacing::Scs30) => 217,
        (Bandwidth::Bw80, SubcarrierSpacing::Scs60) => 107,
        (Bandwidth::Bw80, SubcarrierSpacing::Scs120) => 51,
        (Bandwidth::Bw100, SubcarrierSpacing::Scs30) => 273,
        (Bandwidth::Bw100, SubcarrierSpacing::Scs60) => 135,
        (Bandwidth::Bw100, SubcarrierSpacing::Scs120) => 65,
        _ => return Err(LayerError::InvalidConfiguration(
            format!("Invalid bandwidth {:?} and SCS {:?} combination", bandwidth, scs)
        )),
    };
    
    Ok(num_rbs)
}
