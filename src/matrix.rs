//! Matrices of large non-negative integers and their FFT product.
//!
//! [`mul_fft`] transforms every entry of both operands exactly once and
//! computes the `K`-term dot products of an `M x K` by `K x N` product in
//! the transform domain, which is the entire win over multiplying entries
//! pairwise: the transforms are shared across a whole row of `A` and
//! column of `B`. Coefficients carry `(n*w - depth - ceil(log2 K)) / 2`
//! bits each so a `K`-way accumulated dot product cannot overflow the
//! ring.
//!
//! Entries are plain little-endian limb vectors; the surrounding
//! computer-algebra machinery (signed entries, modular reductions,
//! fraction-free elimination) lives outside this crate.

use rayon::prelude::*;

use crate::fft::{fft_truncate_sqrt2, ifft_truncate_sqrt2, FftBuf};
use crate::pack::{combine_bits, split_bits};
use crate::{fermat, limb, Limb, LIMB_BITS};

// ======================================================================
// IntMat - PUBLIC

/// A dense matrix of non-negative arbitrary-precision integers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntMat {
    rows: usize,
    cols: usize,
    entries: Vec<Vec<Limb>>,
}

impl IntMat {
    /// Creates a `rows x cols` matrix of zeros.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            entries: vec![Vec::new(); rows * cols],
        }
    }

    /// Number of rows.
    pub fn nrows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn ncols(&self) -> usize {
        self.cols
    }

    /// The entry at `(i, j)` as a little-endian limb slice (possibly with
    /// trailing zero limbs; empty means zero).
    pub fn entry(&self, i: usize, j: usize) -> &[Limb] {
        &self.entries[i * self.cols + j]
    }

    /// Replaces the entry at `(i, j)`.
    pub fn set_entry(&mut self, i: usize, j: usize, value: Vec<Limb>) {
        self.entries[i * self.cols + j] = value;
    }

    /// Sets every entry to zero.
    pub fn zero(&mut self) {
        for e in &mut self.entries {
            e.clear();
        }
    }

    /// Bit length of the largest entry, 0 for the zero matrix.
    pub fn max_bits(&self) -> usize {
        self.entries.iter().map(|e| bit_length(e)).max().unwrap_or(0)
    }

    /// Compares entries as integers, ignoring trailing zero limbs.
    pub fn equals(&self, other: &IntMat) -> bool {
        self.rows == other.rows
            && self.cols == other.cols
            && self
                .entries
                .iter()
                .zip(&other.entries)
                .all(|(a, b)| trim(a) == trim(b))
    }
}

fn trim(e: &[Limb]) -> &[Limb] {
    let mut len = e.len();
    while len > 0 && e[len - 1] == 0 {
        len -= 1;
    }
    &e[..len]
}

fn bit_length(e: &[Limb]) -> usize {
    let t = trim(e);
    match t.last() {
        None => 0,
        Some(&top) => t.len() * LIMB_BITS - top.leading_zeros() as usize,
    }
}

// ======================================================================
// FUNCTIONS - PUBLIC

/// `c = a * b` over non-negative integer matrices, transform-domain dot
/// products throughout.
///
/// # Panics
///
/// If the inner dimensions disagree or `c` has the wrong shape.
pub fn mul_fft(c: &mut IntMat, a: &IntMat, b: &IntMat) {
    assert_eq!(a.ncols(), b.nrows());
    assert_eq!(c.nrows(), a.nrows());
    assert_eq!(c.ncols(), b.ncols());

    if a.nrows() == 0 || a.ncols() == 0 || b.ncols() == 0 {
        c.zero();
        return;
    }

    let abits = a.max_bits();
    let bbits = b.max_bits();
    if abits == 0 || bbits == 0 {
        c.zero();
        return;
    }

    let k = a.ncols();
    let kbits = LIMB_BITS - (k as Limb).leading_zeros() as usize;

    let mut depth = 6usize;
    let mut w = 1usize;
    let mut n = 1usize << depth;

    // tiny entries still go through the smallest transform
    let bits1 = abits.max(2000);
    let bits2 = bbits.max(2000);

    let mut bits = (n * w - (depth + kbits)) / 2;
    let mut j1 = (bits1 + bits - 1) / bits;
    let mut j2 = (bits2 + bits - 1) / bits;
    debug_assert!(j1 + j2 - 1 > 2 * n);

    while j1 + j2 - 1 > 4 * n {
        if w == 1 {
            w = 2;
        } else {
            depth += 1;
            w = 1;
            n *= 2;
        }
        bits = (n * w - (depth + kbits)) / 2;
        j1 = (bits1 + bits - 1) / bits;
        j2 = (bits2 + bits - 1) / bits;
    }

    // the depth/w table adjustment used for plain products can push n
    // below what j1 + j2 - 1 <= 4n tolerates here, so only probe for a
    // smaller w
    let wadj = 1;
    if w > wadj {
        loop {
            w -= wadj;
            bits = (n * w - (depth + kbits)) / 2;
            j1 = (bits1 + bits - 1) / bits;
            j2 = (bits2 + bits - 1) / bits;
            if j1 + j2 - 1 > 4 * n || w <= wadj {
                break;
            }
        }
        w += wadj;
    }

    bits = (n * w - (depth + kbits)) / 2;
    j1 = (bits1 + bits - 1) / bits;
    j2 = (bits2 + bits - 1) / bits;

    mul_truncate_sqrt2_inner(c, a, abits, b, bbits, depth, w, kbits, j1, j2);
}

/// Classical schoolbook product, the reference the FFT path is tested
/// against.
pub fn mul_classical(c: &mut IntMat, a: &IntMat, b: &IntMat) {
    assert_eq!(a.ncols(), b.nrows());
    assert_eq!(c.nrows(), a.nrows());
    assert_eq!(c.ncols(), b.ncols());

    for i in 0..a.nrows() {
        for j in 0..b.ncols() {
            let mut acc: Vec<Limb> = Vec::new();
            for h in 0..a.ncols() {
                let x = trim(a.entry(i, h));
                let y = trim(b.entry(h, j));
                if x.is_empty() || y.is_empty() {
                    continue;
                }
                let mut prod = vec![0 as Limb; x.len() + y.len()];
                limb::mul_basecase(&mut prod, x, y);
                if acc.len() < prod.len() + 1 {
                    acc.resize(prod.len() + 1, 0);
                }
                limb::add(&mut acc, &prod);
            }
            c.set_entry(i, j, acc);
        }
    }
}

// ======================================================================
// FUNCTIONS - PRIVATE

/// The transform-domain product with explicit parameters: transform all
/// entries once, then produce each output entry from a `K`-term pointwise
/// dot product followed by one inverse transform.
#[allow(clippy::too_many_arguments)]
fn mul_truncate_sqrt2_inner(
    c: &mut IntMat,
    a: &IntMat,
    abits: usize,
    b: &IntMat,
    bbits: usize,
    depth: usize,
    w: usize,
    kbits: usize,
    j1: usize,
    j2: usize,
) {
    let m = a.nrows();
    let k = a.ncols();
    let nn = b.ncols();
    let n = 1usize << depth;
    let bits1 = (n * w - (depth + kbits)) / 2;
    let climbs = (abits + bbits + kbits + LIMB_BITS - 1) / LIMB_BITS;
    let limbs = (n * w) / LIMB_BITS;
    let size = limbs + 1;

    assert!(limbs > 0);
    assert_eq!(limbs * LIMB_BITS, n * w);
    debug_assert!(j1 > 0 && j2 > 0);
    debug_assert!(j1 + j2 - 1 <= 4 * n);

    // trunc must exceed 2n and be even
    let mut trunc = (j1 + j2 - 1).max(2 * n + 1);
    trunc += trunc & 1;

    let split_and_transform = |entry: &[Limb]| -> FftBuf {
        let mut buf = FftBuf::new(4 * n, limbs);
        let mut v = buf.view();
        let entry = trim(entry);
        let got = if entry.is_empty() {
            0
        } else {
            split_bits(&mut v, entry, bits1)
        };
        v.zero_coeffs(got..4 * n);
        fft_truncate_sqrt2(&mut v, 0, n, w, trunc);
        for l in 0..trunc {
            fermat::norm(v.coeff_mut(l));
        }
        drop(v);
        buf
    };

    // every input entry is transformed exactly once
    let acoeffs: Vec<FftBuf> = (0..m * k)
        .into_par_iter()
        .map(|idx| split_and_transform(a.entry(idx / k, idx % k)))
        .collect();
    let bcoeffs: Vec<FftBuf> = (0..k * nn)
        .into_par_iter()
        .map(|idx| split_and_transform(b.entry(idx / nn, idx % nn)))
        .collect();

    let out: Vec<Vec<Limb>> = (0..m * nn)
        .into_par_iter()
        .map(|idx| {
            let (i, j) = (idx / nn, idx % nn);
            let mut cbuf = FftBuf::new(4 * n, limbs);
            let mut t = vec![0 as Limb; size];
            let mut tt = vec![0 as Limb; 2 * limbs];

            for l in 0..trunc {
                let cl = cbuf.coeff_mut(l);
                for h in 0..k {
                    let al = acoeffs[i * k + h].coeff(l);
                    let bl = bcoeffs[h * nn + j].coeff(l);
                    if h == 0 {
                        limb::mulmod_2expp1_basecase(cl, al, bl, &mut tt);
                    } else {
                        limb::mulmod_2expp1_basecase(&mut t, al, bl, &mut tt);
                        cl[limbs] = cl[limbs].wrapping_add(t[limbs]);
                        let cy = limb::add_n(&mut cl[..limbs], &t[..limbs]);
                        cl[limbs] = cl[limbs].wrapping_add(cy);
                        fermat::norm(cl);
                    }
                }
            }

            let mut v = cbuf.view();
            ifft_truncate_sqrt2(&mut v, 0, n, w, trunc);
            for l in 0..trunc {
                let cl = v.coeff_mut(l);
                fermat::div_2exp(cl, (depth + 2) as u32);
                fermat::norm(cl);
            }

            let mut res = vec![0 as Limb; climbs];
            combine_bits(&mut res, &v, j1 + j2 - 1, bits1, limbs);
            res
        })
        .collect();

    for (idx, e) in out.into_iter().enumerate() {
        c.set_entry(idx / nn, idx % nn, e);
    }
}

// ======================================================================
// TESTS
