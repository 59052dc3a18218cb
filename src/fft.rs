//! Radix-2 transforms over the Fermat ring.
//!
//! **This is an advanced module which is not needed for [basic usage].**
//!
//! This module is relevant if you want to
//! - run your own FFT pipeline over [`split_bits`] output.
//! - understand/benchmark/test the transforms at low level.
//!
//! # Transforms
//!
//! A transform buffer ([`FftBuf`]) holds `2n` (or `4n` for the sqrt2
//! variants) coefficients in `Z / (2^(n*w) + 1)` with `n = 2^depth`. The
//! `2n`-th root of unity is `2^w`; for odd `w` the extra sqrt2 layer
//! doubles the usable length. Variants:
//!
//! - [`fft_radix2`] / [`ifft_radix2`] — the plain recursive transform.
//! - [`fft_truncate`] / [`ifft_truncate`] — compute only the outputs the
//!   caller will consume.
//! - [`fft_truncate_sqrt2`] / [`ifft_truncate_sqrt2`] — truncated with the
//!   sqrt2 layer, logical length `4n`.
//! - [`fft_mfa_truncate_sqrt2`] / [`ifft_mfa_truncate_sqrt2`] — the
//!   two-factor (matrix-Fourier) arrangement, plus the
//!   [`fft_mfa_truncate_sqrt2_outer`] / [`mfa_truncate_sqrt2_inner`] split
//!   that fuses pointwise multiplication into the parallel row phase.
//! - [`fft_negacyclic`] / [`ifft_negacyclic`] — pre-twisted transform for
//!   multiplication modulo `x^(2n) + 1`.
//!
//! Forward outputs are in bit-reversed order; inverse transforms return
//! `length` times the input, so callers divide each coefficient by the
//! transform length afterwards.
//!
//! [basic usage]: crate#basic-usage
//! [`split_bits`]: crate::pack::split_bits

pub use self::buffer::{FftBuf, FftView, Slot};
pub use self::butterfly::{
    fft_adjust, fft_adjust_sqrt2, fft_butterfly, fft_butterfly_sqrt2, fft_butterfly_twiddle,
    ifft_butterfly, ifft_butterfly_sqrt2, ifft_butterfly_twiddle,
};
pub use self::mfa::{
    bit_reverse, fft_mfa_truncate_sqrt2, fft_mfa_truncate_sqrt2_outer, fft_radix2_twiddle,
    fft_truncate1_twiddle, ifft_mfa_truncate_sqrt2, ifft_mfa_truncate_sqrt2_outer,
    ifft_radix2_twiddle, ifft_truncate1_twiddle, mfa_truncate_sqrt2_inner,
};
pub use self::radix2::{
    fft_negacyclic, fft_radix2, fft_truncate, fft_truncate1, ifft_negacyclic, ifft_radix2,
    ifft_truncate, ifft_truncate1,
};
pub use self::sqrt2::{fft_truncate_sqrt2, ifft_truncate_sqrt2};

mod buffer;
mod butterfly;
mod mfa;
mod radix2;
mod sqrt2;
