//! Buffer views used by SRS extraction
//! 
//! Keeps the flattened index algebra of the receive buffer, the extracted
//! signal buffer and the comb offset table in one place.

use super::constants::MAX_SRS_SYMBOLS;
use super::SrsError;
use crate::phy::frame_structure::FrameParms;
use ndarray::{s, Array2, ArrayView1, ArrayView2, ArrayViewMut1};

/// Frequency-domain receive buffer, one row of packed I/Q samples per antenna
///
/// Each row spans `RX_SLOT_WINDOW` slots; symbol `l` of slot `n` starts at
/// `((n mod 4) * symbols_per_slot + l) * ofdm_symbol_size`.
#[derive(Debug, Clone)]
pub struct RxDataF<'a> {
    data: ArrayView2<'a, i32>,
}

impl<'a> RxDataF<'a> {
    /// Wrap a receive buffer after checking it covers the cell's receive window
    pub fn new(data: ArrayView2<'a, i32>, frame_parms: &FrameParms) -> Result<Self, SrsError> {
        let (rows, cols) = data.dim();
        if rows < frame_parms.nb_antennas_rx {
            return Err(SrsError::BufferShape(format!(
                "receive buffer has {} antenna rows, {} expected", rows, frame_parms.nb_antennas_rx
            )));
        }
        if cols < frame_parms.rxdataf_len() {
            return Err(SrsError::BufferShape(format!(
                "receive buffer rows hold {} samples, {} expected", cols, frame_parms.rxdataf_len()
            )));
        }
        Ok(Self { data })
    }
    
    /// Number of antenna rows
    pub fn nb_antennas(&self) -> usize {
        self.data.nrows()
    }
    
    /// `len` samples of antenna `ant` starting at `offset`
    pub fn span(&self, ant: usize, offset: usize, len: usize) -> Result<ArrayView1<'_, i32>, SrsError> {
        let (rows, cols) = self.data.dim();
        if ant >= rows || offset + len > cols {
            return Err(SrsError::BufferShape(format!(
                "span {}..{} of antenna {} outside a {}x{} receive buffer",
                offset, offset + len, ant, rows, cols
            )));
        }
        Ok(self.data.slice(s![ant, offset..offset + len]))
    }
}

/// Extracted SRS samples, one row per receive antenna
///
/// Rows are laid out as `l * ofdm_symbol_size + k` for SRS symbol `l` and FFT
/// bin `k`. The buffer is sized once for the largest occasion so it can be
/// reused slot after slot; only the span of the last extraction is exposed.
#[derive(Debug, Clone)]
pub struct SrsSignalBuffer {
    data: Array2<i32>,
    ofdm_symbol_size: usize,
    n_symb: usize,
}

impl SrsSignalBuffer {
    /// Allocate a buffer for `nb_antennas_rx` rows
    pub fn new(nb_antennas_rx: usize, ofdm_symbol_size: usize) -> Self {
        Self {
            data: Array2::zeros((nb_antennas_rx, ofdm_symbol_size * MAX_SRS_SYMBOLS)),
            ofdm_symbol_size,
            n_symb: 0,
        }
    }
    
    /// Allocate a buffer matching the cell frame parameters
    pub fn for_frame_parms(frame_parms: &FrameParms) -> Self {
        Self::new(frame_parms.nb_antennas_rx, frame_parms.ofdm_symbol_size)
    }
    
    /// Number of antenna rows
    pub fn nb_antennas(&self) -> usize {
        self.data.nrows()
    }
    
    /// Number of SRS symbols held since the last extraction
    pub fn n_symb(&self) -> usize {
        self.n_symb
    }
    
    /// Extracted row of antenna `ant`, `ofdm_symbol_size * n_symb` samples
    pub fn antenna(&self, ant: usize) -> ArrayView1<'_, i32> {
        self.data.slice(s![ant, ..self.ofdm_symbol_size * self.n_symb])
    }
    
    /// Sample at SRS symbol `symbol`, FFT bin `subcarrier`
    pub fn get(&self, ant: usize, symbol: usize, subcarrier: usize) -> Option<i32> {
        if ant >= self.nb_antennas() || symbol >= self.n_symb || subcarrier >= self.ofdm_symbol_size {
            return None;
        }
        Some(self.data[[ant, symbol * self.ofdm_symbol_size + subcarrier]])
    }
    
    /// Check the shape against the cell and set the active symbol count
    pub(crate) fn prepare(&mut self, frame_parms: &FrameParms, n_symb: usize) -> Result<(), SrsError> {
        if self.nb_antennas() < frame_parms.nb_antennas_rx
            || self.ofdm_symbol_size != frame_parms.ofdm_symbol_size
        {
            return Err(SrsError::BufferShape(format!(
                "signal buffer is {} antennas x FFT {}, cell needs {} x {}",
                self.nb_antennas(), self.ofdm_symbol_size,
                frame_parms.nb_antennas_rx, frame_parms.ofdm_symbol_size
            )));
        }
        if n_symb > MAX_SRS_SYMBOLS {
            return Err(SrsError::BufferShape(format!(
                "{} SRS symbols exceed the buffer capacity of {}", n_symb, MAX_SRS_SYMBOLS
            )));
        }
        self.n_symb = n_symb;
        Ok(())
    }
    
    /// Whole row of antenna `ant`
    pub(crate) fn row_mut(&mut self, ant: usize) -> ArrayViewMut1<'_, i32> {
        self.data.slice_mut(s![ant, ..])
    }
}

/// Comb offsets k_0^(p) indexed by `[port][symbol]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombOffsetTable {
    k_0_p: Array2<u16>,
}

impl CombOffsetTable {
    /// Wrap a precomputed `[port][symbol]` table
    pub fn new(k_0_p: Array2<u16>) -> Self {
        Self { k_0_p }
    }
    
    /// Build the table from one row of offsets per port
    pub fn from_rows(rows: &[Vec<u16>]) -> Result<Self, SrsError> {
        let n_symb = rows.first().map_or(0, Vec::len);
        if n_symb == 0 || rows.iter().any(|row| row.len() != n_symb) {
            return Err(SrsError::InvalidConfiguration(
                "comb offset rows must be non-empty and of equal length".to_string()
            ));
        }
        let k_0_p = Array2::from_shape_vec((rows.len(), n_symb), rows.concat())
            .map_err(|e| SrsError::InvalidConfiguration(e.to_string()))?;
        Ok(Self { k_0_p })
    }
    
    /// (ports, symbols) covered by the table
    pub fn dim(&self) -> (usize, usize) {
        self.k_0_p.dim()
    }
    
    /// Offset of port `port` on SRS symbol `symbol`
    pub fn get(&self, port: usize, symbol: usize) -> Option<usize> {
        self.k_0_p.get((port, symbol)).map(|&k_0| k_0 as usize)
    }
    
    /// Check the table covers an occasion and every offset is a valid FFT bin
    pub fn check(&self, n_ap: usize, n_symb: usize, ofdm_symbol_size: usize) -> Result<(), SrsError> {
        let (ports, symbols) = self.dim();
        if ports < n_ap || symbols < n_symb {
            return Err(SrsError::BufferShape(format!(
                "comb offset table is {}x{}, occasion needs {}x{}", ports, symbols, n_ap, n_symb
            )));
        }
        let covered = self.k_0_p.slice(s![..n_ap, ..n_symb]);
        if let Some(&k_0) = covered.iter().find(|&&k_0| k_0 as usize >= ofdm_symbol_size) {
            return Err(SrsError::InvalidConfiguration(format!(
                "comb offset {} outside FFT of size {}", k_0, ofdm_symbol_size
            )));
        }
        Ok(())
    }
}

/// Subcarrier indices visited by one comb
///
/// Starts at `base + offset` and advances by `step`, wrapping into
/// `[0, width)` with a single subtraction. That is exact as long as `base`
/// and `offset` are below `width` and `step` does not exceed it.
#[derive(Debug, Clone)]
pub struct CombWalk {
    subcarrier: usize,
    step: usize,
    remaining: usize,
    width: usize,
}

impl CombWalk {
    pub fn new(base: usize, offset: usize, step: usize, count: usize, width: usize) -> Self {
        debug_assert!(base < width && offset < width && step <= width);
        
        let mut subcarrier = base + offset;
        if subcarrier >= width {
            subcarrier -= width;
        }
        
        Self {
            subcarrier,
            step,
            remaining: count,
            width,
        }
    }
}

impl Iterator for CombWalk {
    type Item = usize;
    
    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let subcarrier = self.subcarrier;
        self.remaining -= 1;
        
        self.subcarrier += self.step;
        if self.subcarrier >= self.width {
            self.subcarrier -= self.width;
        }
        
        Some(subcarrier)
    }
    
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for CombWalk {}
