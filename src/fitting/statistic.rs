// src/fitting/statistic.rs
//
// Online least-squares cubic fit of a scalar sequence.
//
// The sequence is regressed on normalized time t_i = i / n (i = 1..n). Instead
// of keeping the samples we keep the moments Σ v·iᵏ (k = 0..3) and Σ v². At
// fit time the moments are divided by nᵏ, which turns them into Xᵀv for the
// design matrix X = [1, t, t², t³], and the normal equations XᵀX·β = Xᵀv are
// solved in closed form. XᵀX depends on n only.
//
// Residual:
//   Σ (v_i − p(t_i))² = Σ p(t_i)² + Σ v_i² − 2·β·Xᵀv
// where Σ p(t_i)² is expanded symbolically in n, so no pass over the samples
// is ever needed. Memory is O(1) regardless of stream length.

use crate::error::FitError;

/// Minimum number of samples for a determined cubic fit.
pub const MIN_FIT_SAMPLES: usize = 4;

/// XᵀX for the cubic design matrix over t_i = i / n, i = 1..n.
pub type XtxMatrix = [[f64; 4]; 4];

/// Closed-form XᵀX for `n` samples. Entry (j, k) is Σ (i/n)^(j+k).
pub fn xtx_matrix(n: usize) -> XtxMatrix {
    let n = n as f64;
    let n3 = n * n * n;
    let n5 = n3 * n * n;

    let s0 = n;
    let s1 = n / 2.0 + 0.5;
    let s2 = n / 3.0 + 0.5 + 1.0 / (6.0 * n);
    let s3 = (n * n + 2.0 * n + 1.0) / (4.0 * n);
    let s4 = n / 5.0 + 0.5 + 1.0 / (3.0 * n) - 1.0 / (30.0 * n3);
    let s5 = n / 6.0 + 0.5 + 5.0 / (12.0 * n) - 1.0 / (12.0 * n3);
    let s6 = n / 7.0 + 0.5 + 1.0 / (2.0 * n) - 1.0 / (6.0 * n3) + 1.0 / (42.0 * n5);

    [
        [s0, s1, s2, s3],
        [s1, s2, s3, s4],
        [s2, s3, s4, s5],
        [s3, s4, s5, s6],
    ]
}

/// Σ_{i=1..n} p(i/n)² for the cubic with coefficients `a`.
fn polynomial_square_sum(a: &[f64; 4], n: usize) -> f64 {
    let [a0, a1, a2, a3] = *a;
    let n = n as f64;
    let n3 = n * n * n;
    let n5 = n3 * n * n;

    let constant = a0 * a1
        + a0 * a2
        + a0 * a3
        + a1 * a1 / 2.0
        + a1 * a2
        + a1 * a3
        + a2 * a2 / 2.0
        + a2 * a3
        + a3 * a3 / 2.0;
    let linear = a0 * a0
        + a0 * a1
        + 2.0 * a0 * a2 / 3.0
        + a0 * a3 / 2.0
        + a1 * a1 / 3.0
        + a1 * a2 / 2.0
        + 2.0 * a1 * a3 / 5.0
        + a2 * a2 / 5.0
        + a2 * a3 / 3.0
        + a3 * a3 / 7.0;
    let inverse = a0 * a2 / 3.0
        + a0 * a3 / 2.0
        + a1 * a1 / 6.0
        + a1 * a2 / 2.0
        + 2.0 * a1 * a3 / 3.0
        + a2 * a2 / 3.0
        + 5.0 * a2 * a3 / 6.0
        + a3 * a3 / 2.0;
    let inverse_cubed = -a1 * a3 / 15.0 - a2 * a2 / 30.0 - a2 * a3 / 6.0 - a3 * a3 / 6.0;

    constant + a3 * a3 / (42.0 * n5) + n * linear + inverse / n + inverse_cubed / n3
}

/// Cubic p(t) = a0 + a1·t + a2·t² + a3·t³ over normalized time t ∈ [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Polynomial {
    pub coefficients: [f64; 4],
}

impl Polynomial {
    pub fn new(coefficients: [f64; 4]) -> Self {
        Self { coefficients }
    }

    pub fn eval(&self, t: f64) -> f64 {
        let [a0, a1, a2, a3] = self.coefficients;
        ((a3 * t + a2) * t + a1) * t + a0
    }

    /// One coordinate of the equivalent cubic Bezier control points.
    pub fn bezier_handles(&self) -> [f64; 4] {
        let [a0, a1, a2, a3] = self.coefficients;
        let p0 = a0;
        let p3 = a0 + a1 + a2 + a3;
        [
            p0,
            p0 + a1 / 3.0,
            p3 - (a1 + 2.0 * a2 + 3.0 * a3) / 3.0,
            p3,
        ]
    }
}

/// Running moments of one scalar dimension.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatisticAccumulator {
    count: usize,
    /// moments[k] = Σ v·iᵏ over 1-based insertion index i.
    moments: [f64; 4],
    square_sum: f64,
}

impl StatisticAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.count = 0;
        self.moments = [0.0; 4];
        self.square_sum = 0.0;
    }

    pub fn insert(&mut self, value: f64) {
        let index = (self.count + 1) as f64;

        let mut weighted = value;
        for moment in self.moments.iter_mut() {
            *moment += weighted;
            weighted *= index;
        }

        self.square_sum += value * value;
        self.count += 1;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn moments(&self) -> &[f64; 4] {
        &self.moments
    }

    /// Fit a cubic to everything inserted since the last reset.
    ///
    /// `xtx` must be `xtx_matrix(self.count())`; it is taken as a parameter so
    /// that both axes of a planar fit share one matrix.
    pub fn fit(&self, xtx: &XtxMatrix) -> Result<(Polynomial, f64), FitError> {
        if self.count < MIN_FIT_SAMPLES {
            return Err(FitError::InsufficientSamples { found: self.count });
        }

        let n = self.count as f64;
        let mut normalized = [0.0; 4];
        let mut divisor = 1.0;
        for (target, moment) in normalized.iter_mut().zip(self.moments.iter()) {
            *target = moment / divisor;
            divisor *= n;
        }

        let coefficients = solve_4x4(xtx, &normalized).ok_or(FitError::DegenerateSystem {
            samples: self.count,
        })?;

        let projection: f64 = coefficients
            .iter()
            .zip(normalized.iter())
            .map(|(c, m)| c * m)
            .sum();
        let residual =
            polynomial_square_sum(&coefficients, self.count) + self.square_sum - 2.0 * projection;

        Ok((Polynomial::new(coefficients), residual))
    }
}

/// Solve a 4×4 linear system with Gaussian elimination and partial pivoting.
/// Returns None if the system is singular.
pub(crate) fn solve_4x4(mat: &[[f64; 4]; 4], rhs: &[f64; 4]) -> Option<[f64; 4]> {
    let mut m = [[0.0f64; 5]; 4];
    for (row, (src, b)) in m.iter_mut().zip(mat.iter().zip(rhs.iter())) {
        row[..4].copy_from_slice(src);
        row[4] = *b;
    }

    for col in 0..4 {
        let mut max_val = m[col][col].abs();
        let mut max_row = col;
        for row in (col + 1)..4 {
            if m[row][col].abs() > max_val {
                max_val = m[row][col].abs();
                max_row = row;
            }
        }

        if max_val < 1e-12 {
            return None;
        }

        if max_row != col {
            m.swap(col, max_row);
        }

        for row in (col + 1)..4 {
            let factor = m[row][col] / m[col][col];
            for j in col..5 {
                m[row][j] -= factor * m[col][j];
            }
        }
    }

    let mut x = [0.0f64; 4];
    for row in (0..4).rev() {
        let mut acc = m[row][4];
        for j in (row + 1)..4 {
            acc -= m[row][j] * x[j];
        }
        x[row] = acc / m[row][row];
    }

    if x.iter().all(|v| v.is_finite()) {
        Some(x)
    } else {
        None
    }
}
