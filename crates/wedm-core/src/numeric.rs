use crate::CoreError;

/// Floating point type used throughout system
pub type Real = f64;

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Check a whole field, reporting the first offending element.
pub fn ensure_all_finite(values: &[Real], what: &'static str) -> Result<(), CoreError> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(CoreError::NonFiniteElement {
            what,
            index,
            value: values[index],
        }),
        None => Ok(()),
    }
}

/// Per-step probability of at least one event for a Poisson rate.
///
/// `rate` is in events per unit time and `dt` in the same time unit.
/// Non-positive or non-finite rates give zero.
pub fn poisson_step_probability(rate: Real, dt: Real) -> Real {
    if !rate.is_finite() || rate <= 0.0 || dt <= 0.0 {
        return 0.0;
    }
    (1.0 - (-rate * dt).exp()).clamp(0.0, 1.0)
}

/// Logistic function `1 / (1 + exp(-x))`, saturating instead of overflowing.
pub fn logistic(x: Real) -> Real {
    if x > 500.0 {
        1.0
    } else if x < -500.0 {
        0.0
    } else {
        1.0 / (1.0 + (-x).exp())
    }
}
