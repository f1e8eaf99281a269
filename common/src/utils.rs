//! Common Utilities
//! 
//! Helpers for the packed 16-bit I/Q sample format used by the frequency-domain buffers

use num_complex::Complex;

/// Number of subcarriers in one resource block
pub const NB_SC_PER_RB: usize = 12;

/// Pack a 16-bit I/Q pair into one word (real part low, imaginary part high)
pub fn pack_iq(re: i16, im: i16) -> i32 {
    (((im as u16 as u32) << 16) | re as u16 as u32) as i32
}

/// Split a packed word back into its I/Q components
pub fn unpack_iq(sample: i32) -> Complex<i16> {
    Complex::new((sample & 0xFFFF) as i16, ((sample >> 16) & 0xFFFF) as i16)
}

/// Instantaneous power of a packed sample
pub fn iq_power(sample: i32) -> u64 {
    let iq = unpack_iq(sample);
    let re = iq.re as i64;
    let im = iq.im as i64;
    (re * re + im * im) as u64
}
