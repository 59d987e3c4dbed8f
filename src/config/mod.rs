//! Report configuration.
//!
//! The configuration is a TOML file with one table per concern (`db`, `api`,
//! `report`, `payments`, `rates`, `out`, `loggers`). Every field is parsed as
//! optional first so that a missing section or option produces a precise,
//! fatal diagnostic instead of a generic deserialization error.
//!
//! Secrets may come from the environment (`.env` is honoured):
//! `BIDS_DB_PASSWORD` overrides `db.password`.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;

use crate::bids::FeeSchedule;
use crate::data::rates::NBU_URL;
use crate::domain::FeeBasis;
use crate::error::AppError;

pub const DEFAULT_PAGE_SIZE: usize = 1000;
pub const PASSWORD_ENV: &str = "BIDS_DB_PASSWORD";

#[derive(Debug, Clone, PartialEq)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub page_size: usize,
}

impl DbConfig {
    /// `http://[user:password@]host:port/name`
    pub fn url(&self) -> String {
        let creds = if !self.user.is_empty() && !self.password.is_empty() {
            format!("{}:{}@", self.user, self.password)
        } else {
            String::new()
        };
        let mut url = format!("http://{creds}{}:{}", self.host, self.port);
        if !self.name.is_empty() {
            url.push('/');
            url.push_str(&self.name);
        }
        url
    }
}

/// Validated configuration for a run.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub db: DbConfig,
    pub api_url: String,
    pub rates_url: String,
    pub reference_currency: String,
    pub cutoff: NaiveDate,
    pub schedule: FeeSchedule,
    pub out_dir: PathBuf,
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    db: Option<RawDb>,
    api: Option<RawApi>,
    report: Option<RawReport>,
    payments: Option<RawPayments>,
    rates: Option<RawRates>,
    out: Option<RawOut>,
    loggers: Option<RawLoggers>,
}

#[derive(Debug, Deserialize)]
struct RawDb {
    host: Option<String>,
    port: Option<u16>,
    user: Option<String>,
    password: Option<String>,
    name: Option<String>,
    page_size: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawApi {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawReport {
    reference_currency: Option<String>,
    cutoff_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPayments {
    thresholds: Option<Vec<f64>>,
    primary: Option<Vec<f64>>,
    secondary: Option<Vec<f64>>,
    basis: Option<FeeBasis>,
}

#[derive(Debug, Deserialize)]
struct RawRates {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawOut {
    out_dir: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawLoggers {
    log_file: Option<String>,
}

fn section<'a, T>(value: &'a Option<T>, name: &str) -> Result<&'a T, AppError> {
    value
        .as_ref()
        .ok_or_else(|| AppError::config(format!("No section `{name}` in configuration file")))
}

fn option<T: Clone>(value: &Option<T>, section: &str, name: &str) -> Result<T, AppError> {
    value.clone().ok_or_else(|| {
        AppError::config(format!(
            "No option `{name}` in section `{section}` of configuration file"
        ))
    })
}

fn read_raw(path: &Path) -> Result<RawConfig, AppError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| AppError::io(format!("Failed to read config '{}': {e}", path.display())))?;
    parse_raw(&text)
}

fn parse_raw(text: &str) -> Result<RawConfig, AppError> {
    toml::from_str(text).map_err(|e| AppError::config(format!("Invalid configuration file: {e}")))
}

fn schedule_from(raw: &RawConfig) -> Result<FeeSchedule, AppError> {
    let payments = section(&raw.payments, "payments")?;
    FeeSchedule::new(
        option(&payments.thresholds, "payments", "thresholds")?,
        option(&payments.primary, "payments", "primary")?,
        option(&payments.secondary, "payments", "secondary")?,
        payments.basis.unwrap_or_default(),
    )
}

impl ReportConfig {
    /// Load and validate the configuration file, applying environment overrides.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let raw = read_raw(path)?;
        let mut config = Self::from_raw(&raw)?;
        if let Ok(password) = std::env::var(PASSWORD_ENV) {
            config.db.password = password;
        }
        Ok(config)
    }

    /// Parse configuration text without touching the environment.
    pub fn from_toml(text: &str) -> Result<Self, AppError> {
        Self::from_raw(&parse_raw(text)?)
    }

    fn from_raw(raw: &RawConfig) -> Result<Self, AppError> {
        let db = section(&raw.db, "db")?;
        let db = DbConfig {
            host: option(&db.host, "db", "host")?,
            port: option(&db.port, "db", "port")?,
            user: db.user.clone().unwrap_or_default(),
            password: db.password.clone().unwrap_or_default(),
            name: option(&db.name, "db", "name")?,
            page_size: db.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1),
        };

        let api_url = option(&section(&raw.api, "api")?.url, "api", "url")?;

        let report = section(&raw.report, "report")?;
        let reference_currency = option(&report.reference_currency, "report", "reference_currency")?
            .trim()
            .to_uppercase();
        if reference_currency.is_empty() {
            return Err(AppError::config("report.reference_currency must not be empty."));
        }
        let cutoff_raw = option(&report.cutoff_date, "report", "cutoff_date")?;
        let cutoff = NaiveDate::parse_from_str(cutoff_raw.trim(), "%Y-%m-%d").map_err(|e| {
            AppError::config(format!("Invalid report.cutoff_date '{cutoff_raw}': {e}"))
        })?;

        let schedule = schedule_from(raw)?;

        let rates_url = raw
            .rates
            .as_ref()
            .and_then(|r| r.url.clone())
            .unwrap_or_else(|| NBU_URL.to_string());

        let out_dir = PathBuf::from(option(&section(&raw.out, "out")?.out_dir, "out", "out_dir")?);

        let log_file = raw
            .loggers
            .as_ref()
            .and_then(|l| l.log_file.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            db,
            api_url,
            rates_url,
            reference_currency,
            cutoff,
            schedule,
            out_dir,
            log_file,
        })
    }
}

/// Load only the fee schedule (used by `bids fee`).
pub fn load_fee_schedule(path: &Path) -> Result<FeeSchedule, AppError> {
    schedule_from(&read_raw(path)?)
}
