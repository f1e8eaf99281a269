//! SRS signal extraction
//! 
//! Copies the comb subcarriers of one SRS occasion out of the frequency-domain
//! receive buffer, per 3GPP TS 38.211 Section 6.4.1.4.3. Everything not on the
//! comb reads as zero in the output.

use super::grid::{CombOffsetTable, CombWalk, RxDataF, SrsSignalBuffer};
use super::{SrsBandwidthTable, SrsError, SrsPdu, SrsResourceParams, SrsSignalStatus};
use crate::phy::frame_structure::FrameParms;
use common::utils::{unpack_iq, NB_SC_PER_RB};
use tracing::{debug, trace, warn, Level};

/// Extract the SRS received in `slot` for `pdu` into `srs_received_signal`
///
/// For every receive antenna, UE port and SRS symbol the comb starting at
/// `subcarrier_offset + k_0^(p)` is walked with spacing K_TC over M_sc
/// subcarriers. Each antenna row is zeroed first so bins off the comb are
/// zero. Returns [`SrsSignalStatus::NoSignal`] when every copied sample was
/// zero.
#[allow(clippy::too_many_arguments)]
pub fn get_srs_signal(
    frame_parms: &FrameParms,
    frame: u32,
    slot: u8,
    pdu: &SrsPdu,
    k_0_p: &CombOffsetTable,
    rxdata_f: &RxDataF<'_>,
    bandwidth_table: &dyn SrsBandwidthTable,
    srs_received_signal: &mut SrsSignalBuffer,
) -> Result<SrsSignalStatus, SrsError> {
    let params = SrsResourceParams::derive(frame_parms, slot, pdu, bandwidth_table)?;
    let ofdm_symbol_size = frame_parms.ofdm_symbol_size;
    
    k_0_p.check(params.n_ap, params.n_symb, ofdm_symbol_size)?;
    srs_received_signal.prepare(frame_parms, params.n_symb)?;
    
    debug!("SRS rnti {} at {}.{}: {} ports, {} symbols from l0={}, K_TC={}, M_sc={}, k_offset={}",
           pdu.rnti, frame, slot, params.n_ap, params.n_symb, params.l0,
           params.k_tc, params.m_sc, params.subcarrier_offset);
    
    let trace_samples = tracing::enabled!(Level::TRACE);
    let span_len = params.span_len(ofdm_symbol_size);
    let mut no_srs_signal = true;
    
    for ant in 0..frame_parms.nb_antennas_rx {
        let rx_signal = rxdata_f.span(ant, params.symbol_offset, span_len)?;
        let mut received = srs_received_signal.row_mut(ant);
        received.fill(0);
        
        for p_index in 0..params.n_ap {
            trace!("UE port {} --> gNB Rx antenna {}", p_index, ant);
            
            for l_line in 0..params.n_symb {
                let k_0 = k_0_p.get(p_index, l_line).ok_or_else(|| {
                    SrsError::BufferShape(format!("no comb offset for port {} symbol {}", p_index, l_line))
                })?;
                let l_line_offset = l_line * ofdm_symbol_size;
                
                let comb = CombWalk::new(
                    params.subcarrier_offset,
                    k_0,
                    params.k_tc,
                    params.m_sc,
                    ofdm_symbol_size,
                );
                
                for subcarrier in comb {
                    let index = l_line_offset + subcarrier;
                    let sample = rx_signal[index];
                    received[index] = sample;
                    
                    if sample != 0 {
                        no_srs_signal = false;
                    }
                    
                    if trace_samples {
                        let k = (subcarrier + ofdm_symbol_size - params.subcarrier_offset) % ofdm_symbol_size;
                        let iq = unpack_iq(sample);
                        trace!("symbol {} rb {} ({})\t{}\t{}",
                               params.l0 + l_line, k / NB_SC_PER_RB, k, iq.re, iq.im);
                    }
                }
            }
        }
    }
    
    if no_srs_signal {
        warn!("No SRS signal for rnti {} at {}.{}", pdu.rnti, frame, slot);
        Ok(SrsSignalStatus::NoSignal)
    } else {
        Ok(SrsSignalStatus::Detected)
    }
}
