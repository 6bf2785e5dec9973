//! Gate kernels shared by the dense and sparse representations.
//!
//! Every gate the engine supports reduces to one of two shapes:
//!
//! - a [`PairKernel`]: a 2×2 matrix mixing each *base* index `i` with its
//!   partner `i ^ flip`, restricted to bases matching a selection pattern
//!   (controls set, target clear);
//! - a [`PhaseKernel`]: a scalar applied to every index whose bits cover a
//!   mask.

use std::f64::consts::FRAC_1_SQRT_2;

use num_complex::Complex64;

pub(crate) type Matrix2 = [[Complex64; 2]; 2];

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);
const I: Complex64 = Complex64::new(0.0, 1.0);

#[derive(Debug, Clone, Copy)]
pub(crate) struct PairKernel {
    select_mask: usize,
    select_value: usize,
    pub(crate) flip: usize,
    matrix: Matrix2,
}

impl PairKernel {
    /// Single-qubit unitary on `target`.
    pub(crate) fn single(target: usize, matrix: Matrix2) -> Self {
        Self::controlled(0, target, matrix)
    }

    /// Unitary on `target`, applied only where every bit of `controls` is set.
    pub(crate) fn controlled(controls: usize, target: usize, matrix: Matrix2) -> Self {
        let tgt = 1 << target;
        Self {
            select_mask: controls | tgt,
            select_value: controls,
            flip: tgt,
            matrix,
        }
    }

    /// Exchange of the amplitudes at `a=1,b=0` and `a=0,b=1`.
    pub(crate) fn exchange(a: usize, b: usize) -> Self {
        let (ma, mb) = (1 << a, 1 << b);
        Self {
            select_mask: ma | mb,
            select_value: mb,
            flip: ma | mb,
            matrix: pauli_x(),
        }
    }

    #[inline]
    pub(crate) fn selects(&self, index: usize) -> bool {
        index & self.select_mask == self.select_value
    }

    /// The base index of the pair `index` belongs to, if any.
    #[inline]
    pub(crate) fn base_of(&self, index: usize) -> Option<usize> {
        if self.selects(index) {
            Some(index)
        } else if self.selects(index ^ self.flip) {
            Some(index ^ self.flip)
        } else {
            None
        }
    }

    #[inline]
    pub(crate) fn mix(&self, a: Complex64, b: Complex64) -> (Complex64, Complex64) {
        let m = &self.matrix;
        (m[0][0] * a + m[0][1] * b, m[1][0] * a + m[1][1] * b)
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct PhaseKernel {
    pub(crate) mask: usize,
    pub(crate) phase: Complex64,
}

impl PhaseKernel {
    pub(crate) fn new(mask: usize, phase: Complex64) -> Self {
        Self { mask, phase }
    }

    #[inline]
    pub(crate) fn hits(&self, index: usize) -> bool {
        index & self.mask == self.mask
    }
}

pub(crate) fn hadamard() -> Matrix2 {
    let h = Complex64::new(FRAC_1_SQRT_2, 0.0);
    [[h, h], [h, -h]]
}

pub(crate) fn pauli_x() -> Matrix2 {
    [[ZERO, ONE], [ONE, ZERO]]
}

pub(crate) fn pauli_y() -> Matrix2 {
    [[ZERO, -I], [I, ZERO]]
}

pub(crate) fn rx(theta: f64) -> Matrix2 {
    let c = Complex64::new((theta / 2.0).cos(), 0.0);
    let neg_i_s = Complex64::new(0.0, -(theta / 2.0).sin());
    [[c, neg_i_s], [neg_i_s, c]]
}

pub(crate) fn ry(theta: f64) -> Matrix2 {
    let c = Complex64::new((theta / 2.0).cos(), 0.0);
    let s = Complex64::new((theta / 2.0).sin(), 0.0);
    [[c, -s], [s, c]]
}

pub(crate) fn rz(theta: f64) -> Matrix2 {
    let (s, c) = (theta / 2.0).sin_cos();
    [[Complex64::new(c, -s), ZERO], [ZERO, Complex64::new(c, s)]]
}
