//! Currency rate model.
//!
//! A rate `value` expresses one unit of the common base in this currency, so
//! converting `amount` from `a` to `b` is `amount * b.value / a.value`.

use serde::{Deserialize, Serialize};

/// One currency with its current exchange-rate value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    /// ISO-4217 alphabetic code.
    pub code: String,
    pub value: f64,
}

impl Currency {
    pub fn new(code: impl Into<String>, value: f64) -> Self {
        Self {
            code: code.into(),
            value,
        }
    }

    /// Converts `amount` expressed in `from` into this currency.
    ///
    /// Returns `None` when either rate is zero or not finite.
    pub fn convert_from(&self, amount: f64, from_value: f64) -> Option<f64> {
        if from_value == 0.0 || !from_value.is_finite() || !self.value.is_finite() {
            return None;
        }
        Some(amount * self.value / from_value)
    }
}

#[cfg(test)]
mod tests {
    use super::Currency;

    #[test]
    fn convert_uses_ratio_of_rates() {
        let eur = Currency::new("EUR", 0.9);
        let converted = eur.convert_from(100.0, 1.0).expect("finite rates convert");
        assert!((converted - 90.0).abs() < 1e-9);
    }

    #[test]
    fn convert_rejects_zero_source_rate() {
        let eur = Currency::new("EUR", 0.9);
        assert_eq!(eur.convert_from(100.0, 0.0), None);
        assert_eq!(eur.convert_from(100.0, f64::INFINITY), None);
    }
}
