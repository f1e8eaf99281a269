//! Slot-by-slot SRS reception loop
//! 
//! Registers the SRS occasions due in each slot, fills the frequency-domain
//! receive window and extracts every registered occasion.

use crate::config::{OccasionConfig, SrsRxConfig};
use bytes::Buf;
use common::utils::{iq_power, pack_iq};
use layers::phy::{
    CombOffsetTable, CombWalk, FrameParms, RxDataF, SrsReceiver, SrsSignalBuffer, SrsSignalStatus,
};
use layers::SrsError;
use ndarray::{s, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

/// Amplitude of the synthetic QPSK SRS samples
const SYNTHETIC_AMPLITUDE: i16 = 512;

/// Counters reported at the end of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub slots: u64,
    pub registered: u64,
    pub skipped: u64,
    pub detected: u64,
    pub no_signal: u64,
    pub failed: u64,
    pub stale: u64,
}

/// Drives the SRS receiver of one cell
pub struct SlotRunner {
    receiver: SrsReceiver,
    occasions: Vec<(OccasionConfig, CombOffsetTable)>,
    rxdata_f: Array2<i32>,
    /// Receive window loaded from a dump rather than synthesised
    captured: bool,
    signal: SrsSignalBuffer,
    rng: StdRng,
    stale_slots: u64,
    stats: RunStats,
}

impl SlotRunner {
    pub fn new(
        config: &SrsRxConfig,
        frame_parms: FrameParms,
        capture: Option<Array2<i32>>,
    ) -> anyhow::Result<Self> {
        let receiver = SrsReceiver::new(frame_parms, config.srs.max_occasions)?;
        
        let mut occasions = Vec::with_capacity(config.occasions.len());
        for occasion in &config.occasions {
            let k_0_p = CombOffsetTable::from_rows(&occasion.comb_offsets)?;
            // Slot 0 is representative, the derivation only depends on it modulo 4
            let params = receiver.resource_params(0, &occasion.pdu)?;
            k_0_p.check(params.n_ap, params.n_symb, frame_parms.ofdm_symbol_size)?;
            
            info!("SRS occasion rnti {}: every {} slots at offset {}, {} ports, {} symbols, M_sc {}",
                  occasion.pdu.rnti, occasion.period_slots, occasion.offset_slots,
                  params.n_ap, params.n_symb, params.m_sc);
            occasions.push((occasion.clone(), k_0_p));
        }
        
        let captured = capture.is_some();
        let rxdata_f = match capture {
            Some(data) => data,
            None => Array2::zeros((frame_parms.nb_antennas_rx, frame_parms.rxdataf_len())),
        };
        // Fail on a mismatched dump before the first slot
        RxDataF::new(rxdata_f.view(), &frame_parms)?;
        
        Ok(Self {
            receiver,
            occasions,
            rxdata_f,
            captured,
            signal: SrsSignalBuffer::for_frame_parms(&frame_parms),
            rng: StdRng::seed_from_u64(config.srs.seed),
            stale_slots: config.srs.stale_slots,
            stats: RunStats::default(),
        })
    }
    
    pub fn stats(&self) -> &RunStats {
        &self.stats
    }
    
    /// Process one slot
    pub fn run_slot(&mut self, frame: u32, slot: u8) -> anyhow::Result<()> {
        let frame_parms = *self.receiver.frame_parms();
        self.stats.slots += 1;
        self.stats.stale += self.receiver.release_stale(frame, slot, self.stale_slots) as u64;
        
        let absolute_slot = frame_parms.absolute_slot(frame, slot);
        let mut scheduled = Vec::new();
        
        for (i, (occasion, _)) in self.occasions.iter().enumerate() {
            if !occasion.is_due(absolute_slot) {
                continue;
            }
            match self.receiver.try_fill_srs(frame, slot, &occasion.pdu) {
                Ok(index) => {
                    self.stats.registered += 1;
                    scheduled.push((index, i));
                }
                Err(SrsError::RegistryFull { .. }) => {
                    warn!("Skipping SRS of rnti {} in {}.{}", occasion.pdu.rnti, frame, slot);
                    self.stats.skipped += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
        
        if !self.captured {
            self.synthesize_slot(&frame_parms, slot, &scheduled)?;
        }
        
        for (index, i) in scheduled {
            let (occasion, k_0_p) = &self.occasions[i];
            let rxdata_f = RxDataF::new(self.rxdata_f.view(), &frame_parms)?;
            
            match self.receiver.extract(index, k_0_p, &rxdata_f, &mut self.signal) {
                Ok(SrsSignalStatus::Detected) => {
                    self.stats.detected += 1;
                    for ant in 0..frame_parms.nb_antennas_rx {
                        info!("SRS rnti {} {}.{} antenna {}: {:.1} dB",
                              occasion.pdu.rnti, frame, slot, ant, mean_power_db(&self.signal, ant));
                    }
                }
                Ok(SrsSignalStatus::NoSignal) => self.stats.no_signal += 1,
                Err(e) => {
                    warn!("SRS extraction failed for rnti {}: {}", occasion.pdu.rnti, e);
                    self.stats.failed += 1;
                }
            }
            
            self.receiver.release(index);
        }
        
        Ok(())
    }
    
    /// Clear the slot and place QPSK samples on the combs of transmitting UEs
    fn synthesize_slot(
        &mut self,
        frame_parms: &FrameParms,
        slot: u8,
        scheduled: &[(usize, usize)],
    ) -> anyhow::Result<()> {
        let ofdm_symbol_size = frame_parms.ofdm_symbol_size;
        let slot_start = frame_parms.symbol_offset(slot, 0);
        let slot_len = frame_parms.symbols_per_slot * ofdm_symbol_size;
        self.rxdata_f
            .slice_mut(s![.., slot_start..slot_start + slot_len])
            .fill(0);
        
        for &(_, i) in scheduled {
            let (occasion, k_0_p) = &self.occasions[i];
            if !occasion.transmit {
                debug!("rnti {} silent in slot {}", occasion.pdu.rnti, slot);
                continue;
            }
            let params = self.receiver.resource_params(slot, &occasion.pdu)?;
            
            for ant in 0..frame_parms.nb_antennas_rx {
                for p_index in 0..params.n_ap {
                    for l_line in 0..params.n_symb {
                        let k_0 = k_0_p
                            .get(p_index, l_line)
                            .ok_or_else(|| anyhow::anyhow!("No comb offset for port {} symbol {}", p_index, l_line))?;
                        let symbol_start = params.symbol_offset + l_line * ofdm_symbol_size;
                        
                        let comb = CombWalk::new(params.subcarrier_offset, k_0, params.k_tc, params.m_sc, ofdm_symbol_size);
                        for subcarrier in comb {
                            self.rxdata_f[[ant, symbol_start + subcarrier]] = qpsk_sample(&mut self.rng);
                        }
                    }
                }
            }
        }
        
        Ok(())
    }
}

fn qpsk_sample(rng: &mut StdRng) -> i32 {
    let re = if rng.gen::<bool>() { SYNTHETIC_AMPLITUDE } else { -SYNTHETIC_AMPLITUDE };
    let im = if rng.gen::<bool>() { SYNTHETIC_AMPLITUDE } else { -SYNTHETIC_AMPLITUDE };
    pack_iq(re, im)
}

/// Mean power of the non-zero samples of one antenna, in dB
fn mean_power_db(signal: &SrsSignalBuffer, ant: usize) -> f64 {
    let (count, energy) = signal
        .antenna(ant)
        .iter()
        .filter(|&&sample| sample != 0)
        .fold((0u64, 0u64), |(count, energy), &sample| (count + 1, energy + iq_power(sample)));
    
    if count == 0 {
        return f64::NEG_INFINITY;
    }
    10.0 * (energy as f64 / count as f64).log10()
}

/// Load a little-endian i32 dump of the receive window, antenna rows back to back
pub fn load_rxdataf(path: &str, frame_parms: &FrameParms) -> anyhow::Result<Array2<i32>> {
    let raw = std::fs::read(path)?;
    let samples_per_antenna = frame_parms.rxdataf_len();
    let expected = frame_parms.nb_antennas_rx * samples_per_antenna * 4;
    
    if raw.len() != expected {
        return Err(anyhow::anyhow!(
            "Receive dump {} holds {} bytes, {} expected", path, raw.len(), expected
        ));
    }
    
    let mut buf = raw.as_slice();
    let mut samples = Vec::with_capacity(expected / 4);
    while buf.has_remaining() {
        samples.push(buf.get_i32_le());
    }
    
    info!("Loaded receive window from {}", path);
    Ok(Array2::from_shape_vec((frame_parms.nb_antennas_rx, samples_per_antenna), samples)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    
    const CONFIG: &str = r#"
cell_cfg:
  channel_bandwidth_MHz: 10
  common_scs: 15
  fft_size: 1024
  nof_antennas_rx: 2
srs:
  max_occasions: 2
  seed: 7
occasions:
  - period_slots: 2
    pdu:
      rnti: 256
      num_ant_ports: 1
      num_symbols: 0
      time_start_position: 0
      config_index: 3
      bandwidth_index: 0
      comb_size: 0
    comb_offsets: [[0], [1]]
  - period_slots: 2
    transmit: false
    pdu:
      rnti: 257
      num_ant_ports: 0
      num_symbols: 1
      time_start_position: 3
      config_index: 0
      bandwidth_index: 0
      comb_size: 1
    comb_offsets: [[2, 3]]
  - period_slots: 2
    pdu:
      rnti: 258
      num_ant_ports: 0
      num_symbols: 0
      time_start_position: 0
      config_index: 0
      bandwidth_index: 0
      comb_size: 0
    comb_offsets: [[0]]
"#;
    
    #[test]
    fn test_synthetic_run() {
        let config = SrsRxConfig::from_yaml_str(CONFIG).unwrap();
        let frame_parms = config.cell_cfg.frame_parms().unwrap();
        let mut runner = SlotRunner::new(&config, frame_parms, None).unwrap();
        
        for slot in 0..4 {
            runner.run_slot(0, slot).unwrap();
        }
        
        // Two occasion slots, the third UE never fits in the pool of two
        assert_eq!(runner.stats(), &RunStats {
            slots: 4,
            registered: 4,
            skipped: 2,
            detected: 2,
            no_signal: 2,
            failed: 0,
            stale: 0,
        });
        assert_eq!(runner.receiver.registry().active_count(), 0);
    }
    
    #[test]
    fn test_synthetic_samples_on_comb() {
        let mut config = SrsRxConfig::from_yaml_str(CONFIG).unwrap();
        config.occasions.truncate(1);
        let frame_parms = config.cell_cfg.frame_parms().unwrap();
        let mut runner = SlotRunner::new(&config, frame_parms, None).unwrap();
        runner.run_slot(0, 0).unwrap();
        
        // Ports 0 and 1 fill both combs of the last symbol over 16 RBs
        let base = frame_parms.symbol_offset(0, 13);
        let occupied = runner
            .rxdata_f
            .slice(s![0, base..base + 1024])
            .iter()
            .filter(|&&sample| sample != 0)
            .count();
        assert_eq!(occupied, 192);
        
        let power = mean_power_db(&runner.signal, 1);
        let expected = 10.0 * (2.0 * 512.0f64 * 512.0).log10();
        assert!((power - expected).abs() < 1e-9);
    }
    
    #[test]
    fn test_mismatched_comb_table_rejected() {
        let broken = CONFIG.replace("comb_offsets: [[0], [1]]", "comb_offsets: [[0]]");
        let config = SrsRxConfig::from_yaml_str(&broken).unwrap();
        let frame_parms = config.cell_cfg.frame_parms().unwrap();
        assert!(SlotRunner::new(&config, frame_parms, None).is_err());
    }
    
    #[test]
    fn test_load_rxdataf() {
        let config = SrsRxConfig::from_yaml_str(CONFIG).unwrap();
        let frame_parms = config.cell_cfg.frame_parms().unwrap();
        let total = frame_parms.nb_antennas_rx * frame_parms.rxdataf_len();
        
        let raw: Vec<u8> = (0..total as i32).flat_map(|v| v.to_le_bytes()).collect();
        let path = std::env::temp_dir().join(format!("srs_rxdataf_{}.bin", std::process::id()));
        std::fs::write(&path, &raw).unwrap();
        let path = path.to_string_lossy().to_string();
        
        let data = load_rxdataf(&path, &frame_parms).unwrap();
        assert_eq!(data.dim(), (2, frame_parms.rxdataf_len()));
        assert_eq!(data[[0, 1]], 1);
        assert_eq!(data[[1, 0]], frame_parms.rxdataf_len() as i32);
        
        std::fs::write(&path, &raw[..raw.len() - 4]).unwrap();
        assert!(load_rxdataf(&path, &frame_parms).is_err());
        std::fs::remove_file(&path).unwrap();
    }
}
