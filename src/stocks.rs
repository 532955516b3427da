// Daily closing-price history for the portfolio tickers

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ISO_DATE;

/// Tickers shown on the portfolio page.
pub const PORTFOLIO: [&str; 3] = ["AAPL", "GOOGL", "MSFT"];

/// Roughly one month of trading days.
const HISTORY_WINDOW: usize = 22;

/// Quote download failures. No retry, no caching; the caller decides what
/// to show for a ticker that failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("quote request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed quote payload: {0}")]
    Payload(#[from] csv::Error),

    #[error("no price data for '{0}'")]
    EmptySeries(String),
}

/// One day of closing-price history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// The one seam the dashboard depends on: a symbol in, a time-indexed
/// closing-price series (or a failure) out.
pub trait PriceProvider {
    fn fetch_price_series(&self, symbol: &str) -> Result<Vec<PricePoint>, FetchError>;
}

/// Stooq's daily-history CSV endpoint, fetched over blocking HTTP.
pub struct StooqProvider {
    http: reqwest::blocking::Client,
    base_url: String,
}

impl StooqProvider {
    pub fn new() -> Result<Self, FetchError> {
        let http = reqwest::blocking::Client::builder().build()?;
        Ok(StooqProvider {
            http,
            base_url: "https://stooq.com".to_string(),
        })
    }
}

impl PriceProvider for StooqProvider {
    fn fetch_price_series(&self, symbol: &str) -> Result<Vec<PricePoint>, FetchError> {
        let url = format!(
            "{}/q/d/l/?s={}.us&i=d",
            self.base_url,
            symbol.to_lowercase()
        );
        let payload = self
            .http
            .get(&url)
            .send()?
            .error_for_status()?
            .text()?;

        let series = parse_close_series(symbol, &payload)?;
        Ok(trailing_window(series))
    }
}

/// Parse a `Date,...,Close,...` CSV payload into a price series. A payload
/// without those columns (Stooq answers "No data" for unknown symbols) maps
/// to `EmptySeries`.
fn parse_close_series(symbol: &str, payload: &str) -> Result<Vec<PricePoint>, FetchError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(payload.as_bytes());

    let headers = rdr.headers()?.clone();
    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim().to_lowercase() == name)
    };
    let (Some(date_col), Some(close_col)) = (find("date"), find("close")) else {
        return Err(FetchError::EmptySeries(symbol.to_string()));
    };

    let mut series = Vec::new();
    for result in rdr.records() {
        let row = result?;
        // Stooq marks holidays and gaps with non-numeric placeholders; skip them.
        let Some(date) = row
            .get(date_col)
            .and_then(|v| NaiveDate::parse_from_str(v, ISO_DATE).ok())
        else {
            continue;
        };
        let Some(close) = row.get(close_col).and_then(|v| v.parse::<f64>().ok()) else {
            continue;
        };
        series.push(PricePoint { date, close });
    }

    if series.is_empty() {
        return Err(FetchError::EmptySeries(symbol.to_string()));
    }
    Ok(series)
}

/// Keep the trailing month of an ascending series.
fn trailing_window(mut series: Vec<PricePoint>) -> Vec<PricePoint> {
    if series.len() > HISTORY_WINDOW {
        series.split_off(series.len() - HISTORY_WINDOW)
    } else {
        series
    }
}
