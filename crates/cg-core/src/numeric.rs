use crate::CoreError;

/// Floating point type used for every signal value.
pub type Real = f64;

/// Absolute + relative comparison tolerance.
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Wrap `v` into the half-open band `(-span/2, span/2]`, `span = max - min`.
///
/// Used for continuous inputs (e.g. angles) where the shortest signed distance
/// is wanted instead of the raw difference.
pub fn wrap_into_range(v: Real, min: Real, max: Real) -> Real {
    let span = max - min;
    if span <= 0.0 {
        return v;
    }
    let half = span / 2.0;
    let mut wrapped = (v + half).rem_euclid(span) - half;
    if wrapped <= -half {
        wrapped += span;
    }
    wrapped
}
