use std::ops::Range;

use crate::{limb, Limb};

// ======================================================================
// Slot - PUBLIC

/// Addresses one block of a transform buffer: a logical coefficient or one
/// of the three scratch blocks carried alongside.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    /// Coefficient at the given logical position.
    C(usize),
    /// First butterfly scratch block.
    T1,
    /// Second butterfly scratch block.
    T2,
    /// Spare scratch block (sqrt2 twiddles, pointwise products).
    S1,
}

// ======================================================================
// FftBuf - PUBLIC

/// Owned transform buffer: `len` Fermat coefficients of `limbs + 1` words
/// each plus three scratch blocks, backed by one flat limb arena.
///
/// Logical positions map to arena blocks through a handle table, so a
/// butterfly writes its outputs to scratch and [`FftView::commit`]s the
/// scratch handles into the slots — no limb data moves. All blocks start
/// zeroed.
pub struct FftBuf {
    size: usize,
    handles: Vec<usize>,
    scratch_handles: [usize; 3],
    data: Vec<Limb>,
}

impl FftBuf {
    /// Creates a zeroed buffer of `len` coefficients of `limbs + 1` words.
    pub fn new(len: usize, limbs: usize) -> Self {
        let size = limbs + 1;
        Self {
            size,
            handles: (0..len).collect(),
            scratch_handles: [len, len + 1, len + 2],
            data: vec![0; (len + 3) * size],
        }
    }

    /// Number of logical coefficients.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Returns `true` if this holds no coefficients.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Words per coefficient (`limbs + 1`).
    pub fn size(&self) -> usize {
        self.size
    }

    /// The coefficient at logical position `i`.
    pub fn coeff(&self, i: usize) -> &[Limb] {
        let b = self.handles[i];
        &self.data[b * self.size..(b + 1) * self.size]
    }

    /// Mutable access to the coefficient at logical position `i`.
    pub fn coeff_mut(&mut self, i: usize) -> &mut [Limb] {
        let b = self.handles[i];
        &mut self.data[b * self.size..(b + 1) * self.size]
    }

    /// Borrows the buffer as an [`FftView`] the transform kernels operate on.
    pub fn view(&mut self) -> FftView<'_> {
        FftView {
            size: self.size,
            handles: &mut self.handles,
            scratch_handles: &mut self.scratch_handles,
            data: &mut self.data,
            scratch: &mut [],
        }
    }

    /// Permutes the arena so every handle is the identity, making the
    /// coefficients physically contiguous in logical order.
    pub fn make_contiguous(&mut self) {
        self.view().make_contiguous();
    }

    /// The flat coefficient data, which must already be contiguous
    /// (see [`FftBuf::make_contiguous`]). Scratch blocks are excluded.
    ///
    /// # Panics
    ///
    /// If any handle is not the identity.
    pub fn contiguous_data_mut(&mut self) -> &mut [Limb] {
        assert!(self.handles.iter().enumerate().all(|(i, &b)| i == b));
        let words = self.handles.len() * self.size;
        &mut self.data[..words]
    }
}

// ======================================================================
// FftView - PUBLIC

/// Mutable view of a transform buffer: the working form passed through the
/// transform kernels.
///
/// A view addresses blocks uniformly across two backing slices (`data`,
/// then `scratch`), so a row stripe of a larger buffer plus a borrowed
/// scratch triple behaves exactly like a whole buffer.
pub struct FftView<'a> {
    size: usize,
    handles: &'a mut [usize],
    scratch_handles: &'a mut [usize; 3],
    data: &'a mut [Limb],
    scratch: &'a mut [Limb],
}

impl<'a> FftView<'a> {
    /// Builds a view over a contiguous row of coefficients and a separate
    /// scratch area of three blocks. `handles` is reset to the identity.
    pub fn over(
        data: &'a mut [Limb],
        scratch: &'a mut [Limb],
        handles: &'a mut [usize],
        scratch_handles: &'a mut [usize; 3],
        size: usize,
    ) -> Self {
        debug_assert_eq!(data.len() % size, 0);
        debug_assert_eq!(scratch.len(), 3 * size);
        let blocks = data.len() / size;
        debug_assert_eq!(handles.len(), blocks);
        for (i, h) in handles.iter_mut().enumerate() {
            *h = i;
        }
        *scratch_handles = [blocks, blocks + 1, blocks + 2];
        Self {
            size,
            handles,
            scratch_handles,
            data,
            scratch,
        }
    }

    /// Number of logical coefficients.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Returns `true` if this view holds no coefficients.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Words per coefficient (`limbs + 1`).
    pub fn size(&self) -> usize {
        self.size
    }

    fn block_of(&self, slot: Slot) -> usize {
        match slot {
            Slot::C(i) => self.handles[i],
            Slot::T1 => self.scratch_handles[0],
            Slot::T2 => self.scratch_handles[1],
            Slot::S1 => self.scratch_handles[2],
        }
    }

    fn block(&self, b: usize) -> &[Limb] {
        let db = self.data.len() / self.size;
        if b < db {
            &self.data[b * self.size..(b + 1) * self.size]
        } else {
            let b = b - db;
            &self.scratch[b * self.size..(b + 1) * self.size]
        }
    }

    /// The coefficient at logical position `i`.
    pub fn coeff(&self, i: usize) -> &[Limb] {
        self.block(self.handles[i])
    }

    /// Mutable access to the coefficient at logical position `i`.
    pub fn coeff_mut(&mut self, i: usize) -> &mut [Limb] {
        let [c] = self.parts([Slot::C(i)]);
        c
    }

    /// Zeroes the coefficients in `range` (the zero-padding step of the
    /// multiply pipelines).
    pub fn zero_coeffs(&mut self, range: Range<usize>) {
        for i in range {
            limb::zero(self.coeff_mut(i));
        }
    }

    /// Disjoint mutable borrows of the addressed blocks, in request order.
    ///
    /// # Panics
    ///
    /// If two slots resolve to the same block.
    pub fn parts<const N: usize>(&mut self, slots: [Slot; N]) -> [&mut [Limb]; N] {
        let size = self.size;
        let blocks = slots.map(|s| self.block_of(s));
        let mut order: [usize; N] = std::array::from_fn(|i| i);
        order.sort_unstable_by_key(|&k| blocks[k]);
        for k in 1..N {
            assert_ne!(blocks[order[k - 1]], blocks[order[k]], "aliased blocks");
        }

        let data_blocks = self.data.len() / size;
        let mut out: [Option<&mut [Limb]>; N] = std::array::from_fn(|_| None);
        let mut data_rest: &mut [Limb] = self.data;
        let mut data_pos = 0;
        let mut scr_rest: &mut [Limb] = self.scratch;
        let mut scr_pos = 0;
        for &k in &order {
            let b = blocks[k];
            let blk = if b < data_blocks {
                let tmp = std::mem::take(&mut data_rest);
                let (_, tail) = tmp.split_at_mut(b * size - data_pos);
                let (blk, tail) = tail.split_at_mut(size);
                data_rest = tail;
                data_pos = (b + 1) * size;
                blk
            } else {
                let bs = b - data_blocks;
                let tmp = std::mem::take(&mut scr_rest);
                let (_, tail) = tmp.split_at_mut(bs * size - scr_pos);
                let (blk, tail) = tail.split_at_mut(size);
                scr_rest = tail;
                scr_pos = (bs + 1) * size;
                blk
            };
            out[k] = Some(blk);
        }
        out.map(|o| o.unwrap())
    }

    /// Swaps two logical positions (a pointer swap, no data moves).
    pub fn swap(&mut self, i: usize, j: usize) {
        self.handles.swap(i, j);
    }

    /// Promotes the `T1` scratch block into position `i`; the old block at
    /// `i` becomes the new `T1` scratch.
    pub fn commit_t1(&mut self, i: usize) {
        std::mem::swap(&mut self.handles[i], &mut self.scratch_handles[0]);
    }

    /// Promotes the `T2` scratch block into position `i`.
    pub fn commit_t2(&mut self, i: usize) {
        std::mem::swap(&mut self.handles[i], &mut self.scratch_handles[1]);
    }

    /// Promotes the `S1` scratch block into position `i`.
    pub fn commit_s1(&mut self, i: usize) {
        std::mem::swap(&mut self.handles[i], &mut self.scratch_handles[2]);
    }

    /// Promotes `T1` into position `i` and `T2` into position `j` — the tail
    /// of every butterfly.
    pub fn commit(&mut self, i: usize, j: usize) {
        self.commit_t1(i);
        self.commit_t2(j);
    }

    fn blocks_pair_mut(&mut self, a: usize, b: usize) -> (&mut [Limb], &mut [Limb]) {
        debug_assert_ne!(a, b);
        let size = self.size;
        let db = self.data.len() / size;
        let (lo, hi, swapped) = if a < b { (a, b, false) } else { (b, a, true) };
        let (x, y) = if hi < db {
            let (head, tail) = self.data.split_at_mut(hi * size);
            (
                &mut head[lo * size..(lo + 1) * size],
                &mut tail[..size],
            )
        } else if lo >= db {
            let (lo, hi) = (lo - db, hi - db);
            let (head, tail) = self.scratch.split_at_mut(hi * size);
            (
                &mut head[lo * size..(lo + 1) * size],
                &mut tail[..size],
            )
        } else {
            let hi = hi - db;
            (
                &mut self.data[lo * size..(lo + 1) * size],
                &mut self.scratch[hi * size..(hi + 1) * size],
            )
        };
        if swapped {
            (y, x)
        } else {
            (x, y)
        }
    }

    /// Permutes the underlying blocks so every handle (scratch included)
    /// becomes the identity.
    pub fn make_contiguous(&mut self) {
        let size = self.size;
        let len = self.handles.len();
        let total = len + 3;
        let mut src: Vec<usize> = Vec::with_capacity(total);
        src.extend_from_slice(self.handles);
        src.extend_from_slice(&self.scratch_handles[..]);

        let mut tmp = vec![0 as Limb; size];
        let mut done = vec![false; total];
        for start in 0..total {
            if done[start] || src[start] == start {
                done[start] = true;
                continue;
            }
            tmp.copy_from_slice(self.block(start));
            let mut p = start;
            loop {
                done[p] = true;
                let q = src[p];
                if q == start {
                    let (dst, _) = self.blocks_pair_mut(p, q);
                    dst.copy_from_slice(&tmp);
                    break;
                }
                let (dst, from) = self.blocks_pair_mut(p, q);
                dst.copy_from_slice(from);
                p = q;
            }
        }

        for (i, h) in self.handles.iter_mut().enumerate() {
            *h = i;
        }
        *self.scratch_handles = [len, len + 1, len + 2];
    }
}

// ======================================================================
// TESTS
