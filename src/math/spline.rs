//! Penalised cubic smoothing spline.
//!
//! We minimise
//!
//! ```text
//! Σ (y_i - f(x_i))^2 + λ ∫ f''(x)^2 dx
//! ```
//!
//! over natural cubic splines with knots at the data abscissae, using the
//! Reinsch form (Green & Silverman, ch. 2):
//!
//! ```text
//! (R + λ QᵀQ) γ = Qᵀ y        f = y - λ Q γ
//! ```
//!
//! `Q` (n × n-2) holds the second divided-difference weights and `R`
//! (n-2 × n-2) is the tridiagonal Gram matrix of the B-spline second
//! derivatives. Both are banded, but the curves we smooth are a few hundred
//! samples long so dense `nalgebra` factorisations are fast enough.
//!
//! The smoothing strength is given as `spar`, mapped to λ the way R's
//! `smooth.spline` does: `λ = r · 256^(3·spar − 1)` where
//! `r = n / tr(Q R⁻¹ Qᵀ)` makes `spar` independent of the abscissa scale.

use nalgebra::{DMatrix, DVector};

use crate::error::SmoothingError;

/// The parts of the smoothing system that depend only on the abscissae.
///
/// Building it costs an `(n-2)²` Cholesky solve for the penalty ratio; one
/// basis serves any number of curves over the same grid.
#[derive(Debug, Clone)]
pub struct SplineBasis {
    n: usize,
    penalty: Option<Penalty>,
}

#[derive(Debug, Clone)]
struct Penalty {
    q: DMatrix<f64>,
    qt: DMatrix<f64>,
    r: DMatrix<f64>,
    qtq: DMatrix<f64>,
    /// `n / tr(Q R⁻¹ Qᵀ)`; `None` when `R` is not positive definite.
    ratio: Option<f64>,
}

impl SplineBasis {
    pub fn new(x: &[f64]) -> Result<Self, SmoothingError> {
        let n = x.len();
        if n < 3 {
            return Ok(Self { n, penalty: None });
        }

        let mut h = Vec::with_capacity(n - 1);
        for (index, pair) in x.windows(2).enumerate() {
            let step = pair[1] - pair[0];
            if !(step.is_finite() && step > 0.0) {
                return Err(SmoothingError::UnorderedLevels { index: index + 1 });
            }
            h.push(step);
        }

        let m = n - 2;
        let mut q = DMatrix::<f64>::zeros(n, m);
        let mut r = DMatrix::<f64>::zeros(m, m);
        for j in 0..m {
            q[(j, j)] = 1.0 / h[j];
            q[(j + 1, j)] = -1.0 / h[j] - 1.0 / h[j + 1];
            q[(j + 2, j)] = 1.0 / h[j + 1];

            r[(j, j)] = (h[j] + h[j + 1]) / 3.0;
            if j + 1 < m {
                r[(j, j + 1)] = h[j + 1] / 6.0;
                r[(j + 1, j)] = h[j + 1] / 6.0;
            }
        }

        let qt = q.transpose();
        let qtq = &qt * &q;
        let ratio = penalty_ratio(&r, &qtq, n);
        Ok(Self {
            n,
            penalty: Some(Penalty { q, qt, r, qtq, ratio }),
        })
    }

    /// Number of abscissae.
    pub fn knot_count(&self) -> usize {
        self.n
    }

    /// Smooth `y` (one value per abscissa) with the given `spar`.
    ///
    /// Fewer than 3 samples cannot carry curvature; they are returned unchanged.
    pub fn smooth(&self, y: &[f64], spar: f64) -> Result<Vec<f64>, SmoothingError> {
        if y.len() != self.n {
            return Err(SmoothingError::LengthMismatch {
                levels: self.n,
                depths: y.len(),
            });
        }
        let Some(p) = &self.penalty else {
            return Ok(y.to_vec());
        };

        let lambda = p.ratio.ok_or(SmoothingError::Singular { spar })? * 256f64.powf(3.0 * spar - 1.0);
        let y_vec = DVector::from_column_slice(y);

        let a = &p.r + &p.qtq * lambda;
        let rhs = &p.qt * &y_vec;
        let gamma = match a.clone().cholesky() {
            Some(chol) => chol.solve(&rhs),
            None => a.lu().solve(&rhs).ok_or(SmoothingError::Singular { spar })?,
        };

        let fitted = y_vec - (&p.q * gamma) * lambda;
        if fitted.iter().all(|v| v.is_finite()) {
            Ok(fitted.iter().copied().collect())
        } else {
            Err(SmoothingError::Singular { spar })
        }
    }
}

/// Smooth `y(x)` with the given `spar`.
pub fn smoothing_spline(x: &[f64], y: &[f64], spar: f64) -> Result<Vec<f64>, SmoothingError> {
    if x.len() != y.len() {
        return Err(SmoothingError::LengthMismatch {
            levels: x.len(),
            depths: y.len(),
        });
    }
    SplineBasis::new(x)?.smooth(y, spar)
}

/// `n / tr(R⁻¹ QᵀQ)`, which equals `n / tr(Q R⁻¹ Qᵀ)`.
fn penalty_ratio(r: &DMatrix<f64>, qtq: &DMatrix<f64>, n: usize) -> Option<f64> {
    let chol = r.clone().cholesky()?;
    let z = chol.solve(qtq);
    let trace = z.trace();
    if trace.is_finite() && trace > 0.0 {
        Some(n as f64 / trace)
    } else {
        None
    }
}
