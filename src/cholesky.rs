//! Incrementally grown Cholesky factor of a Gram matrix.
//!
//! Orthogonal matching pursuit adds one atom per iteration, so the Gram
//! matrix `G = D_Iᵀ D_I` of the selected atoms grows by one row and column
//! each time. Rather than refactoring `G` from scratch, the lower-triangular
//! factor `L` (with `G = L Lᵀ`) is extended in place:
//!
//! ```text
//!       | L     0 |
//! L' =  | wᵀ    s |     L w = D_Iᵀ d_new,   s = sqrt(‖d_new‖² - wᵀw)
//! ```
//!
//! Cost per append is O(n²) instead of O(n³).

use nalgebra::{DMatrix, DVector};

use crate::error::{KsvdError, Result};
use crate::Real;

/// Lower-triangular factor kept in the leading block of a pre-allocated
/// square buffer.
#[derive(Clone, Debug)]
pub struct IncrementalCholesky<T: Real> {
    len: usize,
    /// `capacity × capacity`; only the leading `len × len` block is live.
    l: DMatrix<T>,
    /// Triangular-solve workspace.
    scratch: DVector<T>,
}

impl<T: Real> IncrementalCholesky<T> {
    /// Reserve room for a factor of order up to `capacity`.
    pub fn new(capacity: usize) -> Self {
        Self {
            len: 0,
            l: DMatrix::zeros(capacity, capacity),
            scratch: DVector::zeros(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.l.nrows()
    }

    /// Current order of the factor.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drop every row, keeping the allocation.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// `L(row, col)`; zero above the diagonal.
    pub fn get(&self, row: usize, col: usize) -> T {
        assert!(row < self.len && col < self.len, "index outside factor");
        if col > row {
            return T::zero();
        }
        self.l[(row, col)]
    }

    /// Append one row/column for a new atom.
    ///
    /// `cross[j]` is the inner product of the new atom with the j-th atom
    /// already in the factor, `diag` is the new atom's squared norm. Fails
    /// with [`KsvdError::RankDeficientUpdate`] when the new pivot
    /// `diag - wᵀw` is not above `tolerance * diag`; the factor is left
    /// unchanged in that case.
    pub fn push(&mut self, atom: usize, cross: &[T], diag: T, tolerance: T) -> Result<()> {
        assert_eq!(cross.len(), self.len, "cross products must cover every selected atom");
        assert!(self.len < self.capacity(), "Cholesky factor is full");

        let n = self.len;
        let mut w = self.scratch.rows_mut(0, n);
        w.copy_from_slice(cross);
        // Every live pivot is positive, so the solve cannot hit a zero diagonal
        self.l.view((0, 0), (n, n)).solve_lower_triangular_unchecked_mut(&mut w);

        let radicand = diag - w.norm_squared();
        if radicand <= tolerance * diag {
            return Err(KsvdError::RankDeficientUpdate {
                atom,
                selected: n,
            });
        }

        self.l.view_mut((n, 0), (1, n)).tr_copy_from(&w);
        self.l.view_mut((0, n), (n, 1)).fill(T::zero());
        self.l[(n, n)] = radicand.sqrt();
        self.len += 1;
        Ok(())
    }

    /// Solve `L Lᵀ x = rhs` into `out`.
    pub fn solve(&mut self, rhs: &[T], out: &mut [T]) {
        assert_eq!(rhs.len(), self.len);
        assert_eq!(out.len(), self.len);

        let n = self.len;
        let mut x = self.scratch.rows_mut(0, n);
        x.copy_from_slice(rhs);
        let l = self.l.view((0, 0), (n, n));
        l.solve_lower_triangular_unchecked_mut(&mut x);
        l.tr_solve_lower_triangular_unchecked_mut(&mut x);

        for (o, &v) in out.iter_mut().zip(x.iter()) {
            *o = v;
        }
    }
}
