//! Matrix-Fourier (two-factor) transforms for very large lengths.
//!
//! The length-`4n` buffer is reshaped as `n2` rows by `n1` columns per
//! half. Column FFTs carry an extra row-by-column twiddle baked into the
//! final butterfly ([`fft_radix2_twiddle`]); row FFTs are plain radix-2.
//! Working set per inner step is one row, which is what makes this layout
//! cache-friendly at sizes where the straight transform thrashes.
//!
//! The split [`fft_mfa_truncate_sqrt2_outer`] / [`mfa_truncate_sqrt2_inner`]
//! pair fuses the row transforms with the pointwise multiplies; the inner
//! phase farms independent rows out to rayon workers, each with its own
//! scratch triple.

use rayon::prelude::*;

use super::buffer::{FftBuf, FftView, Slot::*};
use super::butterfly::*;
use super::radix2::*;
use crate::mulmod::mulmod_fermat;
use crate::{fermat, limb, Limb, LIMB_BITS};

// ======================================================================
// FUNCTIONS - PUBLIC - bit reversal

/// Reverses the low `depth` bits of `j`.
#[inline(always)]
pub fn bit_reverse(j: usize, depth: usize) -> usize {
    if depth == 0 {
        0
    } else {
        j.reverse_bits() >> (usize::BITS as usize - depth)
    }
}

// ======================================================================
// FUNCTIONS - PUBLIC - strided transforms with twiddles

/// Radix-2 FFT on `2n` coefficients at stride `is`, with the final
/// butterfly twiddled by `2^(ws * (row * col))`: the column transform of
/// the matrix-Fourier algorithm. `r` is the starting row, `c` the column,
/// `rs` the row stride.
#[allow(clippy::too_many_arguments)]
pub fn fft_radix2_twiddle(
    v: &mut FftView<'_>,
    off: usize,
    is: usize,
    n: usize,
    w: usize,
    ws: usize,
    r: usize,
    c: usize,
    rs: usize,
) {
    if n == 0 {
        return;
    }
    let limbs = (w * n) / LIMB_BITS;

    if n == 1 {
        let tw1 = r * c;
        let tw2 = tw1 + rs * c;
        let [u, vv, a, b] = v.parts([T1, T2, C(off), C(off + is)]);
        fft_butterfly_twiddle(u, vv, a, b, limbs, tw1 * ws, tw2 * ws);
        v.commit(off, off + is);
        return;
    }

    for i in 0..n {
        let [s, t, a, b] = v.parts([T1, T2, C(off + i * is), C(off + (n + i) * is)]);
        fft_butterfly(s, t, a, b, i, limbs, w);
        v.commit(off + i * is, off + (n + i) * is);
    }

    fft_radix2_twiddle(v, off, is, n / 2, 2 * w, ws, r, c, 2 * rs);
    fft_radix2_twiddle(v, off + n * is, is, n / 2, 2 * w, ws, r + rs, c, 2 * rs);
}

/// Inverse of [`fft_radix2_twiddle`].
#[allow(clippy::too_many_arguments)]
pub fn ifft_radix2_twiddle(
    v: &mut FftView<'_>,
    off: usize,
    is: usize,
    n: usize,
    w: usize,
    ws: usize,
    r: usize,
    c: usize,
    rs: usize,
) {
    if n == 0 {
        return;
    }
    let limbs = (w * n) / LIMB_BITS;

    if n == 1 {
        let tw1 = r * c;
        let tw2 = tw1 + rs * c;
        let [u, vv, a, b] = v.parts([T1, T2, C(off), C(off + is)]);
        ifft_butterfly_twiddle(u, vv, a, b, limbs, tw1 * ws, tw2 * ws);
        v.commit(off, off + is);
        return;
    }

    ifft_radix2_twiddle(v, off, is, n / 2, 2 * w, ws, r, c, 2 * rs);
    ifft_radix2_twiddle(v, off + n * is, is, n / 2, 2 * w, ws, r + rs, c, 2 * rs);

    for i in 0..n {
        let [s, t, a, b] = v.parts([T1, T2, C(off + i * is), C(off + (n + i) * is)]);
        ifft_butterfly(s, t, a, b, i, limbs, w);
        v.commit(off + i * is, off + (n + i) * is);
    }
}

/// Truncated variant of [`fft_radix2_twiddle`] for inputs whose upper
/// strided coefficients may be non-zero.
#[allow(clippy::too_many_arguments)]
pub fn fft_truncate1_twiddle(
    v: &mut FftView<'_>,
    off: usize,
    is: usize,
    n: usize,
    w: usize,
    ws: usize,
    r: usize,
    c: usize,
    rs: usize,
    trunc: usize,
) {
    if n == 0 {
        return;
    }
    let limbs = (w * n) / LIMB_BITS;

    if trunc == 2 * n {
        fft_radix2_twiddle(v, off, is, n, w, ws, r, c, rs);
    } else if trunc <= n {
        for i in 0..n {
            let [x, y] = v.parts([C(off + i * is), C(off + (n + i) * is)]);
            limb::add_n(x, y);
        }
        fft_truncate1_twiddle(v, off, is, n / 2, 2 * w, ws, r, c, 2 * rs, trunc);
    } else {
        for i in 0..n {
            let [s, t, a, b] = v.parts([T1, T2, C(off + i * is), C(off + (n + i) * is)]);
            fft_butterfly(s, t, a, b, i, limbs, w);
            v.commit(off + i * is, off + (n + i) * is);
        }
        fft_radix2_twiddle(v, off, is, n / 2, 2 * w, ws, r, c, 2 * rs);
        fft_truncate1_twiddle(v, off + n * is, is, n / 2, 2 * w, ws, r + rs, c, 2 * rs, trunc - n);
    }
}

/// Inverse of [`fft_truncate1_twiddle`].
#[allow(clippy::too_many_arguments)]
pub fn ifft_truncate1_twiddle(
    v: &mut FftView<'_>,
    off: usize,
    is: usize,
    n: usize,
    w: usize,
    ws: usize,
    r: usize,
    c: usize,
    rs: usize,
    trunc: usize,
) {
    if n == 0 {
        return;
    }
    let limbs = (w * n) / LIMB_BITS;

    if trunc == 2 * n {
        ifft_radix2_twiddle(v, off, is, n, w, ws, r, c, rs);
    } else if trunc <= n {
        for i in trunc..n {
            let [x, y] = v.parts([C(off + i * is), C(off + (n + i) * is)]);
            limb::add_n(x, y);
            fermat::div_2exp(x, 1);
        }
        ifft_truncate1_twiddle(v, off, is, n / 2, 2 * w, ws, r, c, 2 * rs, trunc);
        for i in 0..trunc {
            let [x, y] = v.parts([C(off + i * is), C(off + (n + i) * is)]);
            limb::double_n(x);
            limb::sub_n(x, y);
        }
    } else {
        ifft_radix2_twiddle(v, off, is, n / 2, 2 * w, ws, r, c, 2 * rs);

        for i in trunc - n..n {
            let [x, y] = v.parts([C(off + i * is), C(off + (n + i) * is)]);
            limb::rsub_n(y, x);
            let [t1, y] = v.parts([T1, C(off + (n + i) * is)]);
            fft_adjust(t1, y, i, limbs, w);
            let [x, y] = v.parts([C(off + i * is), C(off + (n + i) * is)]);
            limb::add_n(x, y);
            v.commit_t1(off + (n + i) * is);
        }

        ifft_truncate1_twiddle(v, off + n * is, is, n / 2, 2 * w, ws, r + rs, c, 2 * rs, trunc - n);

        for i in 0..trunc - n {
            let [s, t, a, b] = v.parts([T1, T2, C(off + i * is), C(off + (n + i) * is)]);
            ifft_butterfly(s, t, a, b, i, limbs, w);
            v.commit(off + i * is, off + (n + i) * is);
        }
    }
}

// ======================================================================
// FUNCTIONS - PRIVATE - shared column phases

/// First layer of the sqrt2 transform restricted to column `i` of the
/// first half, followed by the twiddled column FFT and its bit-reversal.
fn mfa_first_half_column(
    v: &mut FftView<'_>,
    i: usize,
    n: usize,
    w: usize,
    n1: usize,
    n2: usize,
    trunc: usize,
    depth: usize,
    limbs: usize,
) {
    if w % 2 == 1 {
        let mut j = i;
        while j < trunc - 2 * n {
            if j % 2 == 1 {
                let [s, t, a, b, temp] = v.parts([T1, T2, C(j), C(2 * n + j), S1]);
                fft_butterfly_sqrt2(s, t, a, b, j, limbs, w, temp);
            } else {
                let [s, t, a, b] = v.parts([T1, T2, C(j), C(2 * n + j)]);
                fft_butterfly(s, t, a, b, j / 2, limbs, w);
            }
            v.commit(j, 2 * n + j);
            j += n1;
        }
        while j < 2 * n {
            if i % 2 == 1 {
                let [r, a, temp] = v.parts([C(j + 2 * n), C(j), S1]);
                fft_adjust_sqrt2(r, a, j, limbs, w, temp);
            } else {
                let [r, a] = v.parts([C(j + 2 * n), C(j)]);
                fft_adjust(r, a, j / 2, limbs, w);
            }
            j += n1;
        }
    } else {
        let mut j = i;
        while j < trunc - 2 * n {
            let [s, t, a, b] = v.parts([T1, T2, C(j), C(2 * n + j)]);
            fft_butterfly(s, t, a, b, j, limbs, w / 2);
            v.commit(j, 2 * n + j);
            j += n1;
        }
        while j < 2 * n {
            let [r, a] = v.parts([C(j + 2 * n), C(j)]);
            fft_adjust(r, a, j, limbs, w / 2);
            j += n1;
        }
    }

    // column FFT applying z^(row * i) between rows, z = 2^w
    fft_radix2_twiddle(v, i, n1, n2 / 2, w * n1, w, 0, i, 1);
    for j in 0..n2 {
        let s = bit_reverse(j, depth);
        if j < s {
            v.swap(i + j * n1, i + s * n1);
        }
    }
}

/// Truncated twiddled column FFT on column `i` of the second half,
/// with its bit-reversal.
fn mfa_second_half_column(
    v: &mut FftView<'_>,
    i: usize,
    n: usize,
    w: usize,
    n1: usize,
    n2: usize,
    trunc2: usize,
    depth: usize,
) {
    fft_truncate1_twiddle(v, 2 * n + i, n1, n2 / 2, w * n1, w, 0, i, 1, trunc2);
    for j in 0..n2 {
        let s = bit_reverse(j, depth);
        if j < s {
            v.swap(2 * n + i + j * n1, 2 * n + i + s * n1);
        }
    }
}

// ======================================================================
// FUNCTIONS - PUBLIC - full transforms

/// Matrix-Fourier version of the truncated sqrt2 FFT over `4n`
/// coefficients: column FFTs with twiddles, then row FFTs, each half
/// reshaped as `n2` rows by `n1` columns. `trunc` must be divisible by
/// `2 * n1`.
pub fn fft_mfa_truncate_sqrt2(
    v: &mut FftView<'_>,
    n: usize,
    w: usize,
    n1: usize,
    trunc: usize,
) {
    let n2 = (2 * n) / n1;
    let trunc2 = (trunc - 2 * n) / n1;
    let limbs = (n * w) / LIMB_BITS;
    let depth = log2(n2);
    let depth2 = log2(n1);
    debug_assert_eq!(trunc % (2 * n1), 0);

    // first half: columns then rows
    for i in 0..n1 {
        mfa_first_half_column(v, i, n, w, n1, n2, trunc, depth, limbs);
    }
    for i in 0..n2 {
        fft_radix2(v, i * n1, n1 / 2, w * n2);
        for j in 0..n1 {
            let t = bit_reverse(j, depth2);
            if j < t {
                v.swap(i * n1 + j, i * n1 + t);
            }
        }
    }

    // second half: truncated columns then the relevant rows
    for i in 0..n1 {
        mfa_second_half_column(v, i, n, w, n1, n2, trunc2, depth);
    }
    for s in 0..trunc2 {
        let i = bit_reverse(s, depth);
        fft_radix2(v, 2 * n + i * n1, n1 / 2, w * n2);
        for j in 0..n1 {
            let t = bit_reverse(j, depth2);
            if j < t {
                v.swap(2 * n + i * n1 + j, 2 * n + i * n1 + t);
            }
        }
    }
}

/// Inverse of [`fft_mfa_truncate_sqrt2`]; returns `4n` times the first
/// `trunc` coefficients.
pub fn ifft_mfa_truncate_sqrt2(
    v: &mut FftView<'_>,
    n: usize,
    w: usize,
    n1: usize,
    trunc: usize,
) {
    let n2 = (2 * n) / n1;
    let trunc2 = (trunc - 2 * n) / n1;
    let limbs = (n * w) / LIMB_BITS;
    let depth = log2(n2);
    let depth2 = log2(n1);
    debug_assert_eq!(trunc % (2 * n1), 0);

    // first half: row IFFTs then column IFFTs
    for i in 0..n2 {
        for j in 0..n1 {
            let s = bit_reverse(j, depth2);
            if j < s {
                v.swap(i * n1 + j, i * n1 + s);
            }
        }
        ifft_radix2(v, i * n1, n1 / 2, w * n2);
    }
    for i in 0..n1 {
        for j in 0..n2 {
            let s = bit_reverse(j, depth);
            if j < s {
                v.swap(i + j * n1, i + s * n1);
            }
        }
        ifft_radix2_twiddle(v, i, n1, n2 / 2, w * n1, w, 0, i, 1);
    }

    // second half: relevant row IFFTs
    for s in 0..trunc2 {
        let i = bit_reverse(s, depth);
        for j in 0..n1 {
            let t = bit_reverse(j, depth2);
            if j < t {
                v.swap(2 * n + i * n1 + j, 2 * n + i * n1 + t);
            }
        }
        ifft_radix2(v, 2 * n + i * n1, n1 / 2, w * n2);
    }

    // second half: column IFFTs with the sqrt2 layer folded in
    for i in 0..n1 {
        ifft_mfa_second_half_column(v, i, n, w, n1, n2, trunc, trunc2, depth, limbs);
    }
}

/// Column IFFT on column `i` of the second half, with the missing upper
/// inputs re-derived from the first half and the final sqrt2-layer
/// butterflies applied.
#[allow(clippy::too_many_arguments)]
fn ifft_mfa_second_half_column(
    v: &mut FftView<'_>,
    i: usize,
    n: usize,
    w: usize,
    n1: usize,
    n2: usize,
    trunc: usize,
    trunc2: usize,
    depth: usize,
    limbs: usize,
) {
    for j in 0..trunc2 {
        let s = bit_reverse(j, depth);
        if j < s {
            v.swap(2 * n + i + j * n1, 2 * n + i + s * n1);
        }
    }

    for j in trunc2..n2 {
        let u = i + j * n1;
        if w % 2 == 1 {
            if i % 2 == 1 {
                let [r, a, temp] = v.parts([C(2 * n + u), C(u), S1]);
                fft_adjust_sqrt2(r, a, u, limbs, w, temp);
            } else {
                let [r, a] = v.parts([C(2 * n + u), C(u)]);
                fft_adjust(r, a, u / 2, limbs, w);
            }
        } else {
            let [r, a] = v.parts([C(2 * n + u), C(u)]);
            fft_adjust(r, a, u, limbs, w / 2);
        }
    }

    ifft_truncate1_twiddle(v, 2 * n + i, n1, n2 / 2, w * n1, w, 0, i, 1, trunc2);

    if w % 2 == 1 {
        let mut j = i;
        while j < trunc - 2 * n {
            if j % 2 == 1 {
                let [s, t, a, b, temp] = v.parts([T1, T2, C(j), C(2 * n + j), S1]);
                ifft_butterfly_sqrt2(s, t, a, b, j, limbs, w, temp);
            } else {
                let [s, t, a, b] = v.parts([T1, T2, C(j), C(2 * n + j)]);
                ifft_butterfly(s, t, a, b, j / 2, limbs, w);
            }
            v.commit(j, 2 * n + j);
            j += n1;
        }
    } else {
        let mut j = i;
        while j < trunc - 2 * n {
            let [s, t, a, b] = v.parts([T1, T2, C(j), C(2 * n + j)]);
            ifft_butterfly(s, t, a, b, j, limbs, w / 2);
            v.commit(j, 2 * n + j);
            j += n1;
        }
    }

    let mut j = trunc + i - 2 * n;
    while j < 2 * n {
        limb::double_n(v.coeff_mut(j));
        j += n1;
    }
}

// ======================================================================
// FUNCTIONS - PUBLIC - outer/inner split for fused pointwise multiply

/// The column phases of [`fft_mfa_truncate_sqrt2`] only; the row FFTs are
/// left to [`mfa_truncate_sqrt2_inner`], which fuses them with the
/// pointwise multiplies.
pub fn fft_mfa_truncate_sqrt2_outer(
    v: &mut FftView<'_>,
    n: usize,
    w: usize,
    n1: usize,
    trunc: usize,
) {
    let n2 = (2 * n) / n1;
    let trunc2 = (trunc - 2 * n) / n1;
    let limbs = (n * w) / LIMB_BITS;
    let depth = log2(n2);
    debug_assert_eq!(trunc % (2 * n1), 0);

    for i in 0..n1 {
        mfa_first_half_column(v, i, n, w, n1, n2, trunc, depth, limbs);
    }
    for i in 0..n1 {
        mfa_second_half_column(v, i, n, w, n1, n2, trunc2, depth);
    }
}

/// The column phases of [`ifft_mfa_truncate_sqrt2`] plus the final scalar
/// division by the transform length `4n` with normalisation; assumes the
/// row IFFTs were already done by [`mfa_truncate_sqrt2_inner`].
pub fn ifft_mfa_truncate_sqrt2_outer(
    v: &mut FftView<'_>,
    n: usize,
    w: usize,
    n1: usize,
    trunc: usize,
) {
    let n2 = (2 * n) / n1;
    let trunc2 = (trunc - 2 * n) / n1;
    let limbs = (n * w) / LIMB_BITS;
    let depth = log2(n2);
    let depth2 = log2(n1);
    debug_assert_eq!(trunc % (2 * n1), 0);

    for i in 0..n1 {
        for j in 0..n2 {
            let s = bit_reverse(j, depth);
            if j < s {
                v.swap(i + j * n1, i + s * n1);
            }
        }
        ifft_radix2_twiddle(v, i, n1, n2 / 2, w * n1, w, 0, i, 1);
    }

    for i in 0..n1 {
        ifft_mfa_second_half_column(v, i, n, w, n1, n2, trunc, trunc2, depth, limbs);

        // scalar division by 4n = 2^(depth + depth2 + 1), column at a time
        for j in 0..trunc2 {
            let c = v.coeff_mut(2 * n + j * n1 + i);
            fermat::div_2exp(c, (depth + depth2 + 1) as u32);
            fermat::norm(c);
        }
        for j in 0..n2 {
            let c = v.coeff_mut(j * n1 + i);
            fermat::div_2exp(c, (depth + depth2 + 1) as u32);
            fermat::norm(c);
        }
    }
}

// ======================================================================
// FUNCTIONS - PUBLIC - parallel inner phase

/// Scratch carried by each rayon worker of the inner phase: one view
/// triple per operand buffer plus the pointwise multiplier's scratch.
struct RowScratch {
    i_blocks: Vec<Limb>,
    j_blocks: Vec<Limb>,
    i_handles: Vec<usize>,
    j_handles: Vec<usize>,
    i_scratch_handles: [usize; 3],
    j_scratch_handles: [usize; 3],
    tt: Vec<Limb>,
}

impl RowScratch {
    fn new(n1: usize, size: usize) -> Self {
        Self {
            i_blocks: vec![0; 3 * size],
            j_blocks: vec![0; 3 * size],
            i_handles: vec![0; n1],
            j_handles: vec![0; n1],
            i_scratch_handles: [0; 3],
            j_scratch_handles: [0; 3],
            tt: vec![0; 2 * size],
        }
    }
}

/// Row FFTs, normalised pointwise products and row IFFTs for one row of
/// `ii` (and `jj` when distinct). The row is left physically contiguous.
#[allow(clippy::too_many_arguments)]
fn process_row(
    irow: &mut [Limb],
    jrow: Option<&mut [Limb]>,
    scr: &mut RowScratch,
    n1: usize,
    row_w: usize,
    n: usize,
    w: usize,
    limbs: usize,
) {
    let size = limbs + 1;
    let mut iv = FftView::over(
        irow,
        &mut scr.i_blocks,
        &mut scr.i_handles,
        &mut scr.i_scratch_handles,
        size,
    );
    fft_radix2(&mut iv, 0, n1 / 2, row_w);

    match jrow {
        Some(jrow) => {
            let mut jv = FftView::over(
                jrow,
                &mut scr.j_blocks,
                &mut scr.j_handles,
                &mut scr.j_scratch_handles,
                size,
            );
            fft_radix2(&mut jv, 0, n1 / 2, row_w);
            for j in 0..n1 {
                fermat::norm(iv.coeff_mut(j));
                fermat::norm(jv.coeff_mut(j));
                let [dst, a] = iv.parts([S1, C(j)]);
                mulmod_fermat(dst, a, jv.coeff(j), n, w, &mut scr.tt);
                iv.commit_s1(j);
            }
        }
        None => {
            for j in 0..n1 {
                fermat::norm(iv.coeff_mut(j));
                let [dst, a] = iv.parts([S1, C(j)]);
                let a: &[Limb] = a;
                mulmod_fermat(dst, a, a, n, w, &mut scr.tt);
                iv.commit_s1(j);
            }
        }
    }

    ifft_radix2(&mut iv, 0, n1 / 2, row_w);
    iv.make_contiguous();
}

/// Row transforms fused with the pointwise multiplies: for every needed
/// row of both halves, FFT the row(s), multiply `ii` by `jj` (or square
/// `ii` when `jj` is `None`) coefficient-wise with [`mulmod_fermat`], and
/// IFFT the product row. Rows are dispatched to rayon workers as disjoint
/// stripes; results land back in `ii` in logical order.
pub fn mfa_truncate_sqrt2_inner(
    ii: &mut FftBuf,
    jj: Option<&mut FftBuf>,
    n: usize,
    w: usize,
    n1: usize,
    trunc: usize,
) {
    let n2 = (2 * n) / n1;
    let trunc2 = (trunc - 2 * n) / n1;
    let limbs = (n * w) / LIMB_BITS;
    let size = limbs + 1;
    let depth = log2(n2);
    let row_w = w * n2;
    let row_words = n1 * size;

    ii.make_contiguous();
    let needed = |row: usize| row < 2 * n2 && {
        let half_row = row % n2;
        row < n2 || bit_reverse(half_row, depth) < trunc2
    };

    match jj {
        Some(jj) => {
            jj.make_contiguous();
            ii.contiguous_data_mut()
                .par_chunks_mut(row_words)
                .zip(jj.contiguous_data_mut().par_chunks_mut(row_words))
                .enumerate()
                .filter(|(row, _)| needed(*row))
                .for_each_init(
                    || RowScratch::new(n1, size),
                    |scr, (_, (irow, jrow))| {
                        process_row(irow, Some(jrow), scr, n1, row_w, n, w, limbs);
                    },
                );
        }
        None => {
            ii.contiguous_data_mut()
                .par_chunks_mut(row_words)
                .enumerate()
                .filter(|(row, _)| needed(*row))
                .for_each_init(
                    || RowScratch::new(n1, size),
                    |scr, (_, irow)| {
                        process_row(irow, None, scr, n1, row_w, n, w, limbs);
                    },
                );
        }
    }
}

fn log2(n: usize) -> usize {
    debug_assert!(n.is_power_of_two());
    n.trailing_zeros() as usize
}

// ======================================================================
// TESTS
