//! Paginated reads of the `report/bids_owner_date` view.
//!
//! The view is keyed by `[owner, date]`. Pages are requested with
//! `limit = page_size + 1`; the extra row only marks where the next page
//! starts (`startkey` + `startkey_docid`) and is not yielded twice.
//!
//! Both ends of the period are inclusive: row keys carry full timestamps, so
//! the end key is padded past every time of day on the last day.

use std::collections::VecDeque;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::domain::{BidRecord, ViewRow};
use crate::error::AppError;

pub const VIEW_PATH: &str = "_design/report/_view/bids_owner_date";

/// Sorts after any suffix a timestamp can have under CouchDB collation.
const END_OF_DAY: char = '\u{fff0}';

pub struct ViewClient {
    client: Client,
    db_url: String,
    page_size: usize,
}

/// Position of the first row of the next page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageCursor {
    pub key: Value,
    pub doc_id: String,
}

impl ViewClient {
    pub fn new(client: Client, db_url: impl Into<String>, page_size: usize) -> Self {
        Self {
            client,
            db_url: db_url.into(),
            page_size: page_size.max(1),
        }
    }

    /// Iterate the owner's rows dated from day `start` through day `end`.
    pub fn rows(&self, owner: &str, start: &str, end: &str) -> ViewPager<'_> {
        let (startkey, endkey) = key_range(owner, start, end);
        ViewPager {
            view: self,
            endkey,
            next: Some(PageCursor {
                key: startkey,
                doc_id: String::new(),
            }),
            buffer: VecDeque::new(),
            pages: 0,
        }
    }

    fn fetch_page(&self, from: &PageCursor, endkey: &Value) -> Result<Vec<RawViewRow>, AppError> {
        let url = format!("{}/{}", self.db_url.trim_end_matches('/'), VIEW_PATH);
        let limit = (self.page_size + 1).to_string();
        let startkey = from.key.to_string();
        let endkey = endkey.to_string();

        let mut req = self.client.get(&url).query(&[
            ("startkey", startkey.as_str()),
            ("endkey", endkey.as_str()),
            ("limit", limit.as_str()),
        ]);
        if !from.doc_id.is_empty() {
            req = req.query(&[("startkey_docid", from.doc_id.as_str())]);
        }

        let resp = req
            .send()
            .map_err(|e| AppError::source(format!("View request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::source(format!(
                "View request failed with status {}.",
                resp.status()
            )));
        }

        let body: ViewResponse = resp
            .json()
            .map_err(|e| AppError::source(format!("Failed to parse view response: {e}")))?;
        Ok(body.rows)
    }
}

pub struct ViewPager<'a> {
    view: &'a ViewClient,
    endkey: Value,
    next: Option<PageCursor>,
    buffer: VecDeque<ViewRow>,
    pages: usize,
}

impl Iterator for ViewPager<'_> {
    type Item = Result<ViewRow, AppError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(row) = self.buffer.pop_front() {
                return Some(Ok(row));
            }
            let cursor = self.next.take()?;
            match self.view.fetch_page(&cursor, &self.endkey) {
                Ok(raw) => {
                    self.pages += 1;
                    let (rows, next) = split_page(raw, self.view.page_size);
                    log::info!("Fetched view page {} ({} rows)", self.pages, rows.len());
                    self.buffer.extend(rows);
                    self.next = next;
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ViewResponse {
    #[serde(default)]
    rows: Vec<RawViewRow>,
}

#[derive(Debug, Deserialize)]
struct RawViewRow {
    #[serde(default)]
    id: String,
    #[serde(default)]
    key: Value,
    #[serde(default)]
    value: Value,
}

/// `startkey`/`endkey` for the owner's rows on days `start..=end`.
pub fn key_range(owner: &str, start: &str, end: &str) -> (Value, Value) {
    (json!([owner, start]), json!([owner, format!("{end}{END_OF_DAY}")]))
}

/// Keep at most `page_size` rows; a surplus row becomes the next cursor.
fn split_page(mut raw: Vec<RawViewRow>, page_size: usize) -> (Vec<ViewRow>, Option<PageCursor>) {
    let next = if raw.len() > page_size {
        raw.truncate(page_size + 1);
        raw.pop().map(|r| PageCursor { key: r.key, doc_id: r.id })
    } else {
        None
    };

    let rows = raw
        .into_iter()
        .map(|r| ViewRow {
            id: r.id,
            key: r.key,
            record: BidRecord::from_value(r.value),
        })
        .collect();
    (rows, next)
}
