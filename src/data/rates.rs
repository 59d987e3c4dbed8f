//! Exchange-rate sources.
//!
//! Rates are quoted as "units of reference currency per one unit of
//! `currency`" on a given date, so `reference_amount = amount * rate`.

use std::cell::RefCell;
use std::collections::HashMap;

use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::error::AppError;

pub const NBU_URL: &str = "https://bank.gov.ua/NBUStatService/v1/statdirectory/exchange";

pub trait RateSource {
    fn rate(&self, currency: &str, date: NaiveDate) -> Result<f64, AppError>;
}

/// National Bank of Ukraine official rates. Lookups are memoized for the
/// lifetime of the client.
pub struct NbuRates {
    client: Client,
    url: String,
    memo: RefCell<HashMap<(String, NaiveDate), f64>>,
}

impl NbuRates {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            memo: RefCell::new(HashMap::new()),
        }
    }

    fn fetch(&self, currency: &str, date: NaiveDate) -> Result<f64, AppError> {
        let day = date.format("%Y%m%d").to_string();
        let resp = self
            .client
            .get(&self.url)
            .query(&[("valcode", currency), ("date", day.as_str()), ("json", "")])
            .send()
            .map_err(|e| AppError::source(format!("Rate request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::source(format!(
                "Rate request failed with status {}.",
                resp.status()
            )));
        }

        let body: Vec<NbuRate> = resp
            .json()
            .map_err(|e| AppError::source(format!("Failed to parse rate response: {e}")))?;

        rate_from_response(&body, currency, date)
    }
}

impl RateSource for NbuRates {
    fn rate(&self, currency: &str, date: NaiveDate) -> Result<f64, AppError> {
        let code = currency.trim().to_uppercase();
        if code.is_empty() {
            return Err(AppError::source("Missing currency code."));
        }
        if let Some(rate) = self.memo.borrow().get(&(code.clone(), date)) {
            return Ok(*rate);
        }
        let rate = self.fetch(&code, date)?;
        self.memo.borrow_mut().insert((code, date), rate);
        Ok(rate)
    }
}

#[derive(Debug, Deserialize)]
struct NbuRate {
    rate: f64,
}

fn rate_from_response(body: &[NbuRate], currency: &str, date: NaiveDate) -> Result<f64, AppError> {
    let rate = body
        .first()
        .map(|r| r.rate)
        .ok_or_else(|| AppError::source(format!("No {currency} rate published for {date}.")))?;
    if !(rate.is_finite() && rate > 0.0) {
        return Err(AppError::source(format!("Invalid {currency} rate {rate} for {date}.")));
    }
    Ok(rate)
}

/// Fixed rate table.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRates {
    rates: HashMap<(String, NaiveDate), f64>,
}

impl InMemoryRates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rate(mut self, currency: &str, date: NaiveDate, rate: f64) -> Self {
        self.rates.insert((currency.to_uppercase(), date), rate);
        self
    }
}

impl RateSource for InMemoryRates {
    fn rate(&self, currency: &str, date: NaiveDate) -> Result<f64, AppError> {
        self.rates
            .get(&(currency.trim().to_uppercase(), date))
            .copied()
            .ok_or_else(|| AppError::source(format!("No {currency} rate for {date}.")))
    }
}
