//! Missing value handling
//!
//! Only the displacement target is imputed. Covariates with gaps are dropped by
//! the loader rather than filled.

mod interpolate;

pub use interpolate::LinearInterpolator;

/// Check if value is missing (NaN)
#[inline]
pub fn is_missing(v: f64) -> bool {
    v.is_nan()
}
