//! Protocol Stack Layers Library
//! 
//! This crate implements the uplink receive side of the 5G NR physical layer
//! according to 3GPP Release 16.

pub mod phy;

use thiserror::Error;

pub use phy::srs::SrsError;

/// Common errors for protocol layers
#[derive(Error, Debug)]
pub enum LayerError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    
    #[error(transparent)]
    Srs(#[from] SrsError),
}
