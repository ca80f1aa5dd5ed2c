//! Ordinary least squares
//!
//! The design matrix is equilibrated (each column scaled to unit norm) and
//! factorised with Householder QR using column pivoting. Normal equations are
//! never formed: the HST regressors come in nearly collinear pairs
//! (`temperature`/`temp2`, `t`/`t2`), and squaring the condition number would
//! lose most of the available precision.

use super::summary::FitSummary;
use crate::error::{HstError, Result};
use ndarray::{s, Array1, Array2, ArrayView1, ArrayViewMut1};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for [`OlsRegression`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitConfig {
    /// A pivot `|R_kk|` at or below `rank_tolerance * |R_00|` counts as zero
    pub rank_tolerance: f64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            rank_tolerance: 1e-10,
        }
    }
}

impl FitConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rank_tolerance(mut self, tolerance: f64) -> Self {
        self.rank_tolerance = tolerance;
        self
    }
}

/// Householder QR factorisation with column pivoting, `A P = Q R`.
///
/// Q is kept implicitly as the list of reflectors `H_k = I - beta_k v_k v_kᵀ`,
/// each acting on rows `k..`.
#[derive(Debug, Clone)]
pub struct PivotedQr {
    r: Array2<f64>,
    reflectors: Vec<(Array1<f64>, f64)>,
    permutation: Vec<usize>,
}

impl PivotedQr {
    /// Factorise `a` (requires `n_rows >= n_cols`)
    pub fn decompose(mut a: Array2<f64>) -> Self {
        let (n_rows, n_cols) = a.dim();
        let steps = n_rows.min(n_cols);
        let mut permutation: Vec<usize> = (0..n_cols).collect();
        let mut reflectors = Vec::with_capacity(steps);

        for k in 0..steps {
            // Pivot: remaining column with the largest trailing norm
            let pivot = (k..n_cols)
                .map(|j| (j, sq_norm(a.slice(s![k.., j]))))
                .fold((k, f64::NEG_INFINITY), |best, cur| if cur.1 > best.1 { cur } else { best })
                .0;
            if pivot != k {
                for i in 0..n_rows {
                    a.swap([i, k], [i, pivot]);
                }
                permutation.swap(k, pivot);
            }

            let x = a.slice(s![k.., k]).to_owned();
            let norm = sq_norm(x.view()).sqrt();
            if norm == 0.0 {
                reflectors.push((Array1::zeros(n_rows - k), 0.0));
                continue;
            }

            let alpha = if x[0] >= 0.0 { -norm } else { norm };
            let mut v = x;
            v[0] -= alpha;
            let vtv = sq_norm(v.view());
            let beta = if vtv > 0.0 { 2.0 / vtv } else { 0.0 };

            a[[k, k]] = alpha;
            a.slice_mut(s![k + 1.., k]).fill(0.0);
            for j in (k + 1)..n_cols {
                apply_reflector(&v, beta, a.slice_mut(s![k.., j]));
            }

            reflectors.push((v, beta));
        }

        let r = a.slice(s![..steps, ..]).to_owned();
        Self {
            r,
            reflectors,
            permutation,
        }
    }

    /// Upper-triangular factor (`min(n, p) × p`)
    pub fn r(&self) -> &Array2<f64> {
        &self.r
    }

    /// Column permutation: column `k` of `R` is column `permutation[k]` of `A`
    pub fn permutation(&self) -> &[usize] {
        &self.permutation
    }

    /// Numerical rank: pivots above `tolerance * |R_00|`
    pub fn rank(&self, tolerance: f64) -> usize {
        let steps = self.r.nrows().min(self.r.ncols());
        if steps == 0 {
            return 0;
        }
        let largest = self.r[[0, 0]].abs();
        if largest == 0.0 {
            return 0;
        }
        (0..steps)
            .take_while(|&k| self.r[[k, k]].abs() > tolerance * largest)
            .count()
    }

    /// Compute `Qᵀ b`
    pub fn qt_mul(&self, b: &Array1<f64>) -> Array1<f64> {
        let mut out = b.clone();
        for (k, (v, beta)) in self.reflectors.iter().enumerate() {
            apply_reflector(v, *beta, out.slice_mut(s![k..]));
        }
        out
    }

    /// Compute `Q c`
    pub fn q_mul(&self, c: &Array1<f64>) -> Array1<f64> {
        let mut out = c.clone();
        for (k, (v, beta)) in self.reflectors.iter().enumerate().rev() {
            apply_reflector(v, *beta, out.slice_mut(s![k..]));
        }
        out
    }

    /// Inverse of the leading square block of `R` (full rank assumed)
    pub fn r_inverse(&self) -> Array2<f64> {
        let p = self.r.ncols();
        let mut inv = Array2::zeros((p, p));
        for col in 0..p {
            // Solve R x = e_col by back substitution
            for i in (0..p).rev() {
                let mut sum = if i == col { 1.0 } else { 0.0 };
                for j in (i + 1)..p {
                    sum -= self.r[[i, j]] * inv[[j, col]];
                }
                inv[[i, col]] = sum / self.r[[i, i]];
            }
        }
        inv
    }
}

fn sq_norm(v: ArrayView1<f64>) -> f64 {
    v.iter().map(|x| x * x).sum()
}

/// `w <- (I - beta v vᵀ) w`
fn apply_reflector(v: &Array1<f64>, beta: f64, mut w: ArrayViewMut1<f64>) {
    if beta == 0.0 {
        return;
    }
    let s = beta * v.dot(&w);
    w.scaled_add(-s, v);
}

/// Back substitution for upper-triangular `R x = b`
fn solve_upper(r: &Array2<f64>, b: ArrayView1<f64>) -> Array1<f64> {
    let p = r.ncols();
    let mut x = Array1::zeros(p);
    for i in (0..p).rev() {
        let mut sum = b[i];
        for j in (i + 1)..p {
            sum -= r[[i, j]] * x[j];
        }
        x[i] = sum / r[[i, i]];
    }
    x
}

/// A fitted linear model: coefficients aligned with the design-matrix columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedModel {
    /// Column names, in design-matrix order
    pub feature_names: Vec<String>,
    /// One coefficient per column, same order as `feature_names`
    pub coefficients: Array1<f64>,
    /// Index of the constant column in `feature_names`, if any
    pub constant_index: Option<usize>,
    /// Diagnostic statistics of the fit
    pub summary: FitSummary,
}

impl FittedModel {
    /// Coefficient of the constant term, 0 when the model has none
    pub fn constant(&self) -> f64 {
        self.constant_index.map_or(0.0, |i| self.coefficients[i])
    }

    /// Look up a coefficient by column name
    pub fn coefficient(&self, name: &str) -> Option<f64> {
        self.feature_names
            .iter()
            .position(|n| n == name)
            .map(|i| self.coefficients[i])
    }

    pub fn n_columns(&self) -> usize {
        self.coefficients.len()
    }
}

/// Ordinary least squares regression.
///
/// The design matrix passed to [`fit`](Self::fit) must already contain the
/// constant column if an intercept is wanted.
#[derive(Debug, Clone, Default)]
pub struct OlsRegression {
    config: FitConfig,
}

impl OlsRegression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FitConfig) -> Self {
        Self { config }
    }

    /// Minimise `‖y − Xβ‖²`.
    ///
    /// `feature_names` labels the columns of `x`; `constant_index` marks the
    /// intercept column, which also selects centred R² in the summary.
    pub fn fit(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        feature_names: &[String],
        constant_index: Option<usize>,
    ) -> Result<FittedModel> {
        let (n_samples, n_features) = x.dim();

        if n_samples != y.len() {
            return Err(HstError::Fitting(format!(
                "design matrix has {} rows but target has {}",
                n_samples,
                y.len()
            )));
        }
        if feature_names.len() != n_features {
            return Err(HstError::Fitting(format!(
                "{} column names for {} columns",
                feature_names.len(),
                n_features
            )));
        }
        if n_samples == 0 || n_features == 0 {
            return Err(HstError::Fitting("empty design matrix".to_string()));
        }
        if let Some(i) = y.iter().position(|v| !v.is_finite()) {
            return Err(HstError::Fitting(format!("non-finite target value at row {}", i)));
        }
        if let Some(((i, j), _)) = x.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(HstError::Fitting(format!(
                "non-finite value in column '{}' at row {}",
                feature_names[j], i
            )));
        }

        if n_samples < n_features {
            return Err(HstError::RankDeficiency {
                rank: n_samples,
                columns: n_features,
            });
        }

        // Equilibrate columns; zero columns keep scale 1 and surface as a zero pivot
        let scales: Array1<f64> = x
            .columns()
            .into_iter()
            .map(|c| {
                let norm = sq_norm(c).sqrt();
                if norm > 0.0 {
                    norm
                } else {
                    1.0
                }
            })
            .collect();
        let scaled = x / &scales;

        let qr = PivotedQr::decompose(scaled);
        let rank = qr.rank(self.config.rank_tolerance);
        debug!(rank, columns = n_features, "QR factorisation");
        if rank < n_features {
            return Err(HstError::RankDeficiency {
                rank,
                columns: n_features,
            });
        }

        let qty = qr.qt_mul(y);
        let z = solve_upper(qr.r(), qty.slice(s![..n_features]));

        let mut coefficients = Array1::zeros(n_features);
        for (k, &col) in qr.permutation().iter().enumerate() {
            coefficients[col] = z[k] / scales[col];
        }

        // Residuals from the factorisation: Q [0; (Qᵀy)[p..]]
        let mut tail = qty.clone();
        tail.slice_mut(s![..n_features]).fill(0.0);
        let residuals = qr.q_mul(&tail);
        let fitted_values = y - &residuals;

        // Unscaled (XᵀX)⁻¹ diagonal: row norms of R⁻¹, mapped back through the permutation
        let r_inv = qr.r_inverse();
        let mut xtx_inv_diag = Array1::zeros(n_features);
        for (k, &col) in qr.permutation().iter().enumerate() {
            let row_sq: f64 = r_inv.row(k).iter().map(|v| v * v).sum();
            xtx_inv_diag[col] = row_sq / (scales[col] * scales[col]);
        }

        let summary = FitSummary::compute(
            y,
            &coefficients,
            &fitted_values,
            &residuals,
            &xtx_inv_diag,
            constant_index.is_some(),
        )
        .with_names(feature_names);

        Ok(FittedModel {
            feature_names: feature_names.to_vec(),
            coefficients,
            constant_index,
            summary,
        })
    }
}
