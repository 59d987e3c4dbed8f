//! Tiered service fee lookup.
//!
//! Thresholds split the value axis into buckets:
//!
//! - bucket `0`: `value <= thresholds[0]` (including negative values)
//! - bucket `i`: `thresholds[i-1] < value <= thresholds[i]`
//! - bucket `n`: `value > thresholds[n-1]`
//!
//! A value equal to a threshold belongs to the lower bucket. Each channel's rate
//! table has either `n` or `n + 1` entries; bucket indexes past the end of a
//! table clamp to its last rate.

use crate::domain::{FeeBasis, PaymentChannel};
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq)]
pub struct FeeSchedule {
    thresholds: Vec<f64>,
    primary: Vec<f64>,
    secondary: Vec<f64>,
    basis: FeeBasis,
}

impl FeeSchedule {
    pub fn new(
        thresholds: Vec<f64>,
        primary: Vec<f64>,
        secondary: Vec<f64>,
        basis: FeeBasis,
    ) -> Result<Self, AppError> {
        if thresholds.iter().any(|t| !t.is_finite()) {
            return Err(AppError::config("payments.thresholds must be finite numbers."));
        }
        if thresholds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(AppError::config("payments.thresholds must be strictly ascending."));
        }
        check_rates("primary", &primary, thresholds.len())?;
        check_rates("secondary", &secondary, thresholds.len())?;

        Ok(Self {
            thresholds,
            primary,
            secondary,
            basis,
        })
    }

    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    pub fn basis(&self) -> FeeBasis {
        self.basis
    }

    pub fn rates(&self, channel: PaymentChannel) -> &[f64] {
        match channel {
            PaymentChannel::Primary => &self.primary,
            PaymentChannel::Secondary => &self.secondary,
        }
    }

    /// Index of the bucket `value` falls into, in `0..=thresholds.len()`.
    pub fn bucket(&self, value: f64) -> usize {
        self.thresholds
            .iter()
            .position(|&t| value <= t)
            .unwrap_or(self.thresholds.len())
    }

    /// Rate of the bucket containing `value` for the given channel.
    pub fn rate_for(&self, value: f64, channel: PaymentChannel) -> f64 {
        let rates = self.rates(channel);
        let idx = self.bucket(value).min(rates.len() - 1);
        rates[idx]
    }

    pub fn compute_fee(&self, value: f64, channel: PaymentChannel) -> f64 {
        let rate = self.rate_for(value, channel);
        match self.basis {
            FeeBasis::Flat => rate,
            FeeBasis::Proportional => rate * value,
        }
    }
}

fn check_rates(name: &str, rates: &[f64], n_thresholds: usize) -> Result<(), AppError> {
    if rates.is_empty() {
        return Err(AppError::config(format!("payments.{name} must not be empty.")));
    }
    if rates.len() != n_thresholds && rates.len() != n_thresholds + 1 {
        return Err(AppError::config(format!(
            "payments.{name} has {} rates; expected {} or {} for {} thresholds.",
            rates.len(),
            n_thresholds,
            n_thresholds + 1,
            n_thresholds
        )));
    }
    if rates.iter().any(|r| !(r.is_finite() && *r >= 0.0)) {
        return Err(AppError::config(format!(
            "payments.{name} must contain finite, non-negative rates."
        )));
    }
    Ok(())
}
