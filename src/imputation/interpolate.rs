//! Linear interpolation of gaps in an ordered series

use crate::error::{HstError, Result};

/// Fills gaps in an ordered series.
///
/// Interior gaps are interpolated linearly by position between the nearest known
/// neighbours. Gaps before the first or after the last known value take that value
/// (constant extension in both directions, no extrapolation of the slope).
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearInterpolator;

impl LinearInterpolator {
    pub fn new() -> Self {
        Self
    }

    /// Interpolate `values`, returning a series with no missing entries.
    ///
    /// Fails when no value is known at all.
    pub fn interpolate(&self, values: &[Option<f64>]) -> Result<Vec<f64>> {
        let known: Vec<usize> = values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.filter(|x| !super::is_missing(*x)).map(|_| i))
            .collect();

        let (first, last) = match (known.first(), known.last()) {
            (Some(&f), Some(&l)) => (f, l),
            _ => {
                return Err(HstError::DataFormat(
                    "cannot interpolate a series with no known values".to_string(),
                ))
            }
        };

        let value_at = |i: usize| values[i].unwrap_or(f64::NAN);
        let mut out = Vec::with_capacity(values.len());

        // Index into `known` of the last known position at or before i
        let mut left = 0;
        for i in 0..values.len() {
            if i <= first {
                out.push(value_at(first));
                continue;
            }
            if i >= last {
                out.push(value_at(last));
                continue;
            }

            while left + 1 < known.len() && known[left + 1] <= i {
                left += 1;
            }
            let p = known[left];
            if p == i {
                out.push(value_at(i));
                continue;
            }

            let q = known[left + 1];
            let (vp, vq) = (value_at(p), value_at(q));
            let frac = (i - p) as f64 / (q - p) as f64;
            out.push(vp + (vq - vp) * frac);
        }

        Ok(out)
    }

    /// Number of entries that [`interpolate`](Self::interpolate) would fill
    pub fn count_missing(values: &[Option<f64>]) -> usize {
        values
            .iter()
            .filter(|v| v.map_or(true, super::is_missing))
            .count()
    }
}
