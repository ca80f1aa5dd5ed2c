//! Fit diagnostics for OLS
//!
//! Observational only: nothing downstream of the fitter reads these numbers
//! except for display and the optional JSON export.

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};
use std::f64::consts::PI;
use std::fmt;

/// Statistics of an OLS fit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitSummary {
    pub n_obs: usize,
    /// Regressors excluding the constant
    pub df_model: usize,
    pub df_resid: usize,
    pub r_squared: f64,
    pub adj_r_squared: f64,
    pub f_statistic: f64,
    pub f_pvalue: f64,
    pub log_likelihood: f64,
    pub aic: f64,
    pub bic: f64,
    pub durbin_watson: f64,
    /// Residual sum of squares
    pub ssr: f64,
    pub std_errors: Array1<f64>,
    pub t_values: Array1<f64>,
    /// Two-sided p-values of the t statistics
    pub p_values: Array1<f64>,
    /// In-sample fitted values, computed from the QR factors
    pub fitted_values: Array1<f64>,
    pub residuals: Array1<f64>,
    /// Names of the coefficient rows, filled in by the caller for display
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub coefficients: Array1<f64>,
}

impl FitSummary {
    /// Compute fit statistics.
    ///
    /// `xtx_inv_diag` is the diagonal of `(XᵀX)⁻¹`. When there are no residual
    /// degrees of freedom the variance-based statistics are NaN.
    pub fn compute(
        y: &Array1<f64>,
        coefficients: &Array1<f64>,
        fitted_values: &Array1<f64>,
        residuals: &Array1<f64>,
        xtx_inv_diag: &Array1<f64>,
        has_constant: bool,
    ) -> Self {
        let n_obs = y.len();
        let n_params = coefficients.len();
        let df_resid = n_obs.saturating_sub(n_params);
        let df_model = if has_constant { n_params.saturating_sub(1) } else { n_params };

        let ssr: f64 = residuals.iter().map(|e| e * e).sum();
        let centre = if has_constant { y.mean().unwrap_or(0.0) } else { 0.0 };
        let tss: f64 = y.iter().map(|v| (v - centre) * (v - centre)).sum();

        let r_squared = if tss == 0.0 { 1.0 } else { 1.0 - ssr / tss };
        let adj_r_squared = if df_resid == 0 {
            f64::NAN
        } else {
            let n_centre = if has_constant { n_obs - 1 } else { n_obs };
            1.0 - (n_centre as f64 / df_resid as f64) * (1.0 - r_squared)
        };

        let sigma2 = if df_resid == 0 { f64::NAN } else { ssr / df_resid as f64 };

        let (f_statistic, f_pvalue) = if df_resid == 0 || df_model == 0 {
            (f64::NAN, f64::NAN)
        } else {
            let ess = tss - ssr;
            let f = (ess / df_model as f64) / sigma2;
            let p = if f.is_infinite() {
                0.0
            } else {
                FisherSnedecor::new(df_model as f64, df_resid as f64)
                    .map(|d| 1.0 - d.cdf(f))
                    .unwrap_or(f64::NAN)
            };
            (f, p)
        };

        let n = n_obs as f64;
        let log_likelihood = -n / 2.0 * ((2.0 * PI).ln() + (ssr / n).ln() + 1.0);
        let k = n_params as f64;
        let aic = -2.0 * log_likelihood + 2.0 * k;
        let bic = -2.0 * log_likelihood + k * n.ln();

        let durbin_watson = if ssr == 0.0 {
            f64::NAN
        } else {
            residuals
                .windows(2)
                .into_iter()
                .map(|w| (w[1] - w[0]).powi(2))
                .sum::<f64>()
                / ssr
        };

        let std_errors = xtx_inv_diag.mapv(|d| (sigma2 * d).sqrt());
        let t_values = coefficients / &std_errors;
        let t_dist = if df_resid == 0 {
            None
        } else {
            StudentsT::new(0.0, 1.0, df_resid as f64).ok()
        };
        let p_values = t_values.mapv(|t| match &t_dist {
            Some(d) if t.is_finite() => 2.0 * (1.0 - d.cdf(t.abs())),
            Some(_) if t.is_infinite() => 0.0,
            _ => f64::NAN,
        });

        Self {
            n_obs,
            df_model,
            df_resid,
            r_squared,
            adj_r_squared,
            f_statistic,
            f_pvalue,
            log_likelihood,
            aic,
            bic,
            durbin_watson,
            ssr,
            std_errors,
            t_values,
            p_values,
            fitted_values: fitted_values.clone(),
            residuals: residuals.clone(),
            names: Vec::new(),
            coefficients: coefficients.clone(),
        }
    }

    /// Attach coefficient names for display
    pub fn with_names(mut self, names: &[String]) -> Self {
        self.names = names.to_vec();
        self
    }
}

impl fmt::Display for FitSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(78);
        let thin = "-".repeat(78);

        writeln!(f, "{}", rule)?;
        writeln!(f, "{:^78}", "OLS Regression Results")?;
        writeln!(f, "{}", rule)?;
        writeln!(
            f,
            "{:<20}{:>18}   {:<20}{:>17.4}",
            "No. Observations:", self.n_obs, "R-squared:", self.r_squared
        )?;
        writeln!(
            f,
            "{:<20}{:>18}   {:<20}{:>17.4}",
            "Df Residuals:", self.df_resid, "Adj. R-squared:", self.adj_r_squared
        )?;
        writeln!(
            f,
            "{:<20}{:>18}   {:<20}{:>17.4}",
            "Df Model:", self.df_model, "F-statistic:", self.f_statistic
        )?;
        writeln!(
            f,
            "{:<20}{:>18.4}   {:<20}{:>17.4e}",
            "Log-Likelihood:", self.log_likelihood, "Prob (F-statistic):", self.f_pvalue
        )?;
        writeln!(
            f,
            "{:<20}{:>18.4}   {:<20}{:>17.4}",
            "AIC:", self.aic, "BIC:", self.bic
        )?;
        writeln!(f, "{}", thin)?;
        writeln!(
            f,
            "{:<16}{:>14}{:>14}{:>12}{:>12}",
            "", "coef", "std err", "t", "P>|t|"
        )?;
        writeln!(f, "{}", thin)?;
        for i in 0..self.coefficients.len() {
            let name = self.names.get(i).map(String::as_str).unwrap_or("");
            writeln!(
                f,
                "{:<16}{:>14.6e}{:>14.6e}{:>12.3}{:>12.3}",
                name, self.coefficients[i], self.std_errors[i], self.t_values[i], self.p_values[i]
            )?;
        }
        writeln!(f, "{}", rule)?;
        writeln!(f, "{:<20}{:>18.4}", "Durbin-Watson:", self.durbin_watson)?;
        write!(f, "{}", rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_summary_statistics() {
        // y = [1, 3, 2] on x = [0, 1, 2]: intercept 1.5, slope 0.5
        let y = array![1.0, 3.0, 2.0];
        let coef = array![1.5, 0.5];
        let fitted = array![1.5, 2.0, 2.5];
        let resid = &y - &fitted;
        // (XᵀX)⁻¹ for X = [1 x]: [[5/6, -1/2], [-1/2, 1/2]]
        let diag = array![5.0 / 6.0, 0.5];

        let s = FitSummary::compute(&y, &coef, &fitted, &resid, &diag, true);

        assert_eq!(s.n_obs, 3);
        assert_eq!(s.df_model, 1);
        assert_eq!(s.df_resid, 1);
        assert_abs_diff_eq!(s.ssr, 1.5, epsilon = 1e-12);
        assert_abs_diff_eq!(s.r_squared, 0.25, epsilon = 1e-12);
        assert_abs_diff_eq!(s.adj_r_squared, -0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(s.f_statistic, 1.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(s.std_errors[1], 0.75f64.sqrt(), epsilon = 1e-12);
        // Durbin-Watson: ((1.5)² + (1.5)²) / 1.5
        assert_abs_diff_eq!(s.durbin_watson, 3.0, epsilon = 1e-12);
        assert!(s.p_values.iter().all(|p| (0.0..=1.0).contains(p)));
        assert!(s.f_pvalue > 0.0 && s.f_pvalue < 1.0);
    }

    #[test]
    fn test_no_residual_degrees_of_freedom() {
        let y = array![1.0, 2.0];
        let coef = array![1.0, 1.0];
        let zeros = array![0.0, 0.0];
        let s = FitSummary::compute(&y, &coef, &y, &zeros, &array![1.0, 1.0], true);

        assert_eq!(s.df_resid, 0);
        assert!(s.std_errors.iter().all(|v| v.is_nan()));
        assert!(s.p_values.iter().all(|v| v.is_nan()));
        assert!(s.f_statistic.is_nan());
    }

    #[test]
    fn test_display_lists_coefficients() {
        let y = array![1.0, 3.0, 2.0];
        let fitted = array![1.5, 2.0, 2.5];
        let resid = &y - &fitted;
        let s = FitSummary::compute(&y, &array![1.5, 0.5], &fitted, &resid, &array![5.0 / 6.0, 0.5], true)
            .with_names(&["const".to_string(), "temperature".to_string()]);

        let text = s.to_string();
        assert!(text.contains("OLS Regression Results"));
        assert!(text.contains("const"));
        assert!(text.contains("temperature"));
        assert!(text.contains("Durbin-Watson"));
    }
}
