//! Currency normalization into the reference currency.

use chrono::NaiveDate;

use crate::bids::events::{EventSink, PipelineEvent};
use crate::data::rates::RateSource;
use crate::error::AppError;

pub struct CurrencyNormalizer<'a> {
    reference: String,
    rates: &'a dyn RateSource,
    events: &'a dyn EventSink,
}

impl<'a> CurrencyNormalizer<'a> {
    pub fn new(reference: impl Into<String>, rates: &'a dyn RateSource, events: &'a dyn EventSink) -> Self {
        Self {
            reference: reference.into(),
            rates,
            events,
        }
    }

    pub fn is_reference(&self, currency: &str) -> bool {
        currency.trim().eq_ignore_ascii_case(&self.reference)
    }

    /// Convert `value` into the reference currency, returning
    /// `(normalized_value, rate_used)`. The reference currency converts with
    /// rate `1` and no lookup.
    pub fn normalize(
        &self,
        value: f64,
        currency: &str,
        date: NaiveDate,
        tender: &str,
    ) -> Result<(f64, f64), AppError> {
        if self.is_reference(currency) {
            return Ok((value, 1.0));
        }

        let rate = self.rates.rate(currency, date)?;
        let normalized = value * rate;
        self.events.emit(PipelineEvent::CurrencyConverted {
            tender: tender.to_string(),
            currency: currency.to_string(),
            date,
            rate,
            before: value,
            after: normalized,
        });
        Ok((normalized, rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bids::events::MemorySink;
    use crate::data::rates::InMemoryRates;
    use approx::assert_relative_eq;
    use std::cell::Cell;

    struct CountingRates {
        calls: Cell<usize>,
    }

    impl RateSource for CountingRates {
        fn rate(&self, _currency: &str, _date: NaiveDate) -> Result<f64, AppError> {
            self.calls.set(self.calls.get() + 1);
            Ok(2.0)
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2016, 5, 12).unwrap()
    }

    #[test]
    fn reference_currency_is_identity_without_lookup() {
        let rates = CountingRates { calls: Cell::new(0) };
        let sink = MemorySink::new();
        let norm = CurrencyNormalizer::new("UAH", &rates, &sink);

        assert_eq!(norm.normalize(1234.5, "UAH", day(), "t").unwrap(), (1234.5, 1.0));
        assert_eq!(norm.normalize(10.0, "uah", day(), "t").unwrap(), (10.0, 1.0));
        assert_eq!(rates.calls.get(), 0);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn foreign_currency_multiplies_and_logs() {
        let rates = InMemoryRates::new().with_rate("USD", day(), 25.5);
        let sink = MemorySink::new();
        let norm = CurrencyNormalizer::new("UAH", &rates, &sink);

        let (value, rate) = norm.normalize(100.0, "USD", day(), "tender-1").unwrap();
        assert_relative_eq!(value, 2550.0);
        assert_relative_eq!(rate, 25.5);

        let events = sink.events();
        assert_eq!(events.len(), 1);
        match &events[0] {
            PipelineEvent::CurrencyConverted {
                tender,
                currency,
                date,
                before,
                after,
                ..
            } => {
                assert_eq!(tender, "tender-1");
                assert_eq!(currency, "USD");
                assert_eq!(*date, day());
                assert_relative_eq!(*before, 100.0);
                assert_relative_eq!(*after, 2550.0);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn missing_rate_is_an_error_and_not_logged_as_conversion() {
        let rates = InMemoryRates::new();
        let sink = MemorySink::new();
        let norm = CurrencyNormalizer::new("UAH", &rates, &sink);

        assert!(norm.normalize(100.0, "EUR", day(), "t").is_err());
        assert!(sink.events().is_empty());
    }
}
