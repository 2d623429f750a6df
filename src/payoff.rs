//! Payoff (utility) functions over two goods
//!
//! Any `Fn(f64, f64) -> f64` is a payoff function. A non-finite result is
//! treated as an evaluation failure so callers can decide whether to skip
//! the sample or abort the frame.

use serde::{Deserialize, Serialize};

use crate::error::EvalError;

/// A pure two-variable payoff function
pub trait PayoffFunction {
    fn evaluate(&self, x: f64, y: f64) -> Result<f64, EvalError>;
}

impl<F> PayoffFunction for F
where
    F: Fn(f64, f64) -> f64,
{
    #[inline]
    fn evaluate(&self, x: f64, y: f64) -> Result<f64, EvalError> {
        let value = self(x, y);
        if value.is_finite() {
            Ok(value)
        } else {
            Err(EvalError::NonFinite(value))
        }
    }
}

/// Payoff families selectable from a config file
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NamedPayoff {
    /// x^a + y^b
    PowerSum { a: f64, b: f64 },
    /// x^a * y^b
    CobbDouglas { a: f64, b: f64 },
    /// a*x + b*y (perfect substitutes)
    Linear { a: f64, b: f64 },
    /// min(a*x, b*y) (perfect complements)
    Leontief { a: f64, b: f64 },
    /// a*ln(x) + b*y
    QuasiLinear { a: f64, b: f64 },
}

impl NamedPayoff {
    pub fn eval(&self, x: f64, y: f64) -> f64 {
        match *self {
            Self::PowerSum { a, b } => x.powf(a) + y.powf(b),
            Self::CobbDouglas { a, b } => x.powf(a) * y.powf(b),
            Self::Linear { a, b } => a * x + b * y,
            Self::Leontief { a, b } => (a * x).min(b * y),
            Self::QuasiLinear { a, b } => a * x.ln() + b * y,
        }
    }

    /// Closure form, for handing to the surface
    pub fn into_fn(self) -> impl Fn(f64, f64) -> f64 + 'static {
        move |x, y| self.eval(x, y)
    }
}

impl Default for NamedPayoff {
    fn default() -> Self {
        Self::PowerSum { a: 2.0, b: 3.0 }
    }
}
