//! Albor Space 5G GNodeB SRS Receiver
//! 
//! Runs the uplink SRS reception chain of one cell slot by slot, either on a
//! captured frequency-domain receive window or on synthetic UE transmissions.

mod config;
mod runner;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use config::SrsRxConfig;
use layers::phy::frame_structure::NB_FRAMES;
use runner::{load_rxdataf, SlotRunner};

/// Albor Space 5G GNodeB SRS receiver
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "srs_rx.yml")]
    config: String,

    /// Log level (trace, debug, info, warn, error), overrides the configuration file
    #[arg(short, long)]
    log_level: Option<String>,
    
    /// Number of slots to process
    #[arg(long, default_value = "200")]
    slots: u64,
    
    /// System frame number of the first slot
    #[arg(long, default_value = "0")]
    start_frame: u32,
    
    /// Pace processing at one slot per slot duration
    #[arg(long)]
    realtime: bool,
    
    /// Little-endian i32 dump of the frequency-domain receive window
    #[arg(long)]
    rx_dump: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = SrsRxConfig::from_yaml_file(&args.config)?;

    // Initialize logging
    let log_level = args.log_level.clone().unwrap_or_else(|| config.log.phy_level.clone());
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&log_level));
    
    fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .init();

    info!("Starting Albor Space SRS receiver");
    info!("Configuration file: {}", args.config);
    
    let frame_parms = config.cell_cfg.frame_parms()?;
    
    info!("Cell configuration:");
    info!("  Bandwidth: {} MHz ({} RBs)", config.cell_cfg.channel_bandwidth_mhz, frame_parms.num_rbs);
    info!("  Subcarrier spacing: {} kHz", config.cell_cfg.common_scs);
    info!("  FFT size: {}", frame_parms.ofdm_symbol_size);
    info!("  RX antennas: {}", frame_parms.nb_antennas_rx);
    info!("  SRS occasions: {} configured, pool of {}", config.occasions.len(), config.srs.max_occasions);
    
    let rx_dump = args.rx_dump.as_deref().or(config.srs.rx_dump.as_deref());
    let capture = rx_dump
        .map(|path| load_rxdataf(path, &frame_parms))
        .transpose()?;
    if capture.is_none() {
        info!("No receive dump given, synthesising uplink slots");
    }
    
    let mut runner = SlotRunner::new(&config, frame_parms, capture)?;
    
    let mut interval = tokio::time::interval(frame_parms.slot_duration());
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    
    let mut frame = args.start_frame % NB_FRAMES;
    let mut slot: u8 = 0;
    
    for _ in 0..args.slots {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!("Received shutdown signal");
                break;
            }
            _ = interval.tick(), if args.realtime => {}
            _ = std::future::ready(()), if !args.realtime => {}
        }
        
        runner.run_slot(frame, slot)?;
        
        slot += 1;
        if slot as usize >= frame_parms.slots_per_frame {
            slot = 0;
            frame = (frame + 1) % NB_FRAMES;
        }
    }
    
    let stats = runner.stats();
    info!("SRS statistics:");
    info!("  Slots processed: {}", stats.slots);
    info!("  Occasions registered: {}, skipped (pool full): {}", stats.registered, stats.skipped);
    info!("  Detected: {}, no signal: {}", stats.detected, stats.no_signal);
    info!("  Stale releases: {}", stats.stale);
    if stats.failed > 0 {
        warn!("  Failed extractions: {}", stats.failed);
    }
    
    info!("SRS receiver shutdown complete");
    Ok(())
}
