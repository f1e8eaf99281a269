//! YAML Configuration Structures for the SRS receiver
//! 
//! Cell numerology, SRS pool sizing and the periodic SRS occasions to receive

use common::types::{Bandwidth, SubcarrierSpacing};
use layers::phy::{CyclicPrefix, FrameParms, SrsPdu};
use layers::phy::srs::constants::NUMBER_OF_NR_SRS_MAX;
use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SrsRxConfig {
    /// Cell configuration
    pub cell_cfg: CellConfig,
    /// SRS receiver configuration
    #[serde(default)]
    pub srs: SrsConfig,
    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
    /// Periodic SRS occasions scheduled in the cell
    #[serde(default)]
    pub occasions: Vec<OccasionConfig>,
}

/// Cell configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CellConfig {
    /// Channel bandwidth in MHz
    #[serde(rename = "channel_bandwidth_MHz")]
    pub channel_bandwidth_mhz: u32,
    /// Common subcarrier spacing in kHz
    pub common_scs: u32,
    /// FFT size
    pub fft_size: usize,
    /// Number of receive antennas
    #[serde(default = "default_nof_antennas_rx")]
    pub nof_antennas_rx: usize,
    /// Use the extended cyclic prefix
    #[serde(default)]
    pub extended_cp: bool,
}

fn default_nof_antennas_rx() -> usize {
    1
}

impl CellConfig {
    /// Derive the PHY frame parameters of the cell
    pub fn frame_parms(&self) -> anyhow::Result<FrameParms> {
        let bandwidth = Bandwidth::from_mhz(self.channel_bandwidth_mhz)
            .ok_or_else(|| anyhow::anyhow!("Invalid bandwidth: {} MHz", self.channel_bandwidth_mhz))?;
        let scs = SubcarrierSpacing::from_khz(self.common_scs)
            .ok_or_else(|| anyhow::anyhow!("Invalid subcarrier spacing: {} kHz", self.common_scs))?;
        let cyclic_prefix = if self.extended_cp {
            CyclicPrefix::Extended
        } else {
            CyclicPrefix::Normal
        };
        
        Ok(FrameParms::new(scs, cyclic_prefix, bandwidth, self.fft_size, self.nof_antennas_rx)?)
    }
}

/// SRS receiver configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SrsConfig {
    /// Size of the SRS occasion pool
    #[serde(default = "default_max_occasions")]
    pub max_occasions: usize,
    /// Slots after which an unconsumed occasion is released
    #[serde(default = "default_stale_slots")]
    pub stale_slots: u64,
    /// Seed of the synthetic uplink generator
    #[serde(default)]
    pub seed: u64,
    /// Little-endian i32 dump of the frequency-domain receive buffer
    pub rx_dump: Option<String>,
}

fn default_max_occasions() -> usize {
    NUMBER_OF_NR_SRS_MAX
}

fn default_stale_slots() -> u64 {
    8
}

impl Default for SrsConfig {
    fn default() -> Self {
        Self {
            max_occasions: default_max_occasions(),
            stale_slots: default_stale_slots(),
            seed: 0,
            rx_dump: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogConfig {
    /// PHY layer log level
    #[serde(default = "default_log_level")]
    pub phy_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            phy_level: default_log_level(),
        }
    }
}

/// One periodic SRS resource of a UE
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OccasionConfig {
    /// Periodicity in slots (T_SRS)
    pub period_slots: u32,
    /// Slot offset within the period (T_offset)
    #[serde(default)]
    pub offset_slots: u32,
    /// Whether the synthetic UE actually transmits
    #[serde(default = "default_transmit")]
    pub transmit: bool,
    /// SRS PDU sent by the MAC for each occasion
    pub pdu: SrsPdu,
    /// Comb offsets k_0^(p), one row per port and one column per symbol
    pub comb_offsets: Vec<Vec<u16>>,
}

fn default_transmit() -> bool {
    true
}

impl OccasionConfig {
    /// Whether the occasion falls on the given absolute slot
    pub fn is_due(&self, absolute_slot: u64) -> bool {
        absolute_slot % self.period_slots as u64 == self.offset_slots as u64
    }
}

impl SrsRxConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }
    
    /// Parse and validate a YAML document
    pub fn from_yaml_str(contents: &str) -> anyhow::Result<Self> {
        let config: SrsRxConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }
    
    fn validate(&self) -> anyhow::Result<()> {
        for (i, occasion) in self.occasions.iter().enumerate() {
            if occasion.period_slots == 0 {
                return Err(anyhow::anyhow!("Occasion {}: period_slots must be positive", i));
            }
            if occasion.offset_slots >= occasion.period_slots {
                return Err(anyhow::anyhow!(
                    "Occasion {}: offset {} not below period {}",
                    i, occasion.offset_slots, occasion.period_slots
                ));
            }
        }
        Ok(())
    }
}
