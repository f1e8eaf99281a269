//! Per-cell SRS receiver
//! 
//! Owns the frame parameters, the occasion registry and the bandwidth table
//! of one cell, so registration and extraction share the same context.

use super::bandwidth::{NrSrsBandwidthTable, SrsBandwidthTable};
use super::extraction::get_srs_signal;
use super::grid::{CombOffsetTable, RxDataF, SrsSignalBuffer};
use super::registry::SrsRegistry;
use super::{SrsError, SrsPdu, SrsResourceParams, SrsSignalStatus};
use crate::phy::frame_structure::FrameParms;
use crate::LayerError;
use tracing::{debug, info};

/// SRS reception context of one cell
pub struct SrsReceiver {
    frame_parms: FrameParms,
    registry: SrsRegistry,
    bandwidth_table: Box<dyn SrsBandwidthTable + Send + Sync>,
}

impl SrsReceiver {
    /// Create a receiver using the TS 38.211 bandwidth table
    pub fn new(frame_parms: FrameParms, max_occasions: usize) -> Result<Self, LayerError> {
        Self::with_bandwidth_table(frame_parms, max_occasions, Box::new(NrSrsBandwidthTable))
    }
    
    /// Create a receiver with a custom bandwidth table
    pub fn with_bandwidth_table(
        frame_parms: FrameParms,
        max_occasions: usize,
        bandwidth_table: Box<dyn SrsBandwidthTable + Send + Sync>,
    ) -> Result<Self, LayerError> {
        frame_parms.validate()?;
        let registry = SrsRegistry::new(max_occasions)?;
        
        info!("SRS receiver ready: {} occasions, {} RX antennas, FFT {}",
              max_occasions, frame_parms.nb_antennas_rx, frame_parms.ofdm_symbol_size);
        
        Ok(Self {
            frame_parms,
            registry,
            bandwidth_table,
        })
    }
    
    pub fn frame_parms(&self) -> &FrameParms {
        &self.frame_parms
    }
    
    pub fn registry(&self) -> &SrsRegistry {
        &self.registry
    }
    
    /// Register an occasion, panicking if the pool is exhausted
    pub fn fill_srs(&mut self, frame: u32, slot: u8, pdu: &SrsPdu) -> usize {
        self.registry.commit(frame, slot, pdu)
    }
    
    /// Register an occasion, reporting exhaustion to the caller
    pub fn try_fill_srs(&mut self, frame: u32, slot: u8, pdu: &SrsPdu) -> Result<usize, SrsError> {
        self.registry.try_commit(frame, slot, pdu)
    }
    
    /// Resource parameters of `pdu` received in `slot`
    pub fn resource_params(&self, slot: u8, pdu: &SrsPdu) -> Result<SrsResourceParams, SrsError> {
        SrsResourceParams::derive(&self.frame_parms, slot, pdu, self.bandwidth_table.as_ref())
    }
    
    /// Extract the registered occasion `index` using its stored configuration
    pub fn extract(
        &self,
        index: usize,
        k_0_p: &CombOffsetTable,
        rxdata_f: &RxDataF<'_>,
        srs_received_signal: &mut SrsSignalBuffer,
    ) -> Result<SrsSignalStatus, SrsError> {
        let occasion = self
            .registry
            .get(index)
            .filter(|occasion| occasion.is_active())
            .ok_or(SrsError::InactiveOccasion(index))?;
        
        get_srs_signal(
            &self.frame_parms,
            occasion.frame(),
            occasion.slot(),
            occasion.pdu(),
            k_0_p,
            rxdata_f,
            self.bandwidth_table.as_ref(),
            srs_received_signal,
        )
    }
    
    /// Return an occasion to the pool once its samples have been consumed
    pub fn release(&mut self, index: usize) -> bool {
        self.registry.release(index)
    }
    
    /// Drop occasions registered more than `max_age_slots` before (frame, slot)
    pub fn release_stale(&mut self, frame: u32, slot: u8, max_age_slots: u64) -> usize {
        let released = self.registry.release_stale(&self.frame_parms, frame, slot, max_age_slots);
        if released > 0 {
            debug!("Released {} stale SRS occasions at {}.{}", released, frame, slot);
        }
        released
    }
}
