// src/connectors/messages.rs
use serde::Deserialize;

/// Response of GET /v8/finance/chart/<symbol>?range=1d&interval=1d.
/// Only the fields needed to extract a last price are mapped.
#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    pub chart: Chart,
}

#[derive(Debug, Deserialize)]
pub struct Chart {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    #[serde(default)]
    pub error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
pub struct ChartError {
    pub code: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct ChartResult {
    pub meta: ChartMeta,

    #[serde(default)]
    pub timestamp: Vec<i64>,

    #[serde(default)]
    pub indicators: Option<Indicators>,
}

#[derive(Debug, Deserialize)]
pub struct ChartMeta {
    pub symbol: String,

    #[serde(default)]
    pub currency: Option<String>,

    #[serde(rename = "regularMarketPrice", default)]
    pub regular_market_price: Option<f64>,

    #[serde(rename = "regularMarketTime", default)]
    pub regular_market_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<QuoteIndicator>,
}

#[derive(Debug, Deserialize)]
pub struct QuoteIndicator {
    // Yahoo pads missing bars with null
    #[serde(default)]
    pub close: Vec<Option<f64>>,
}

impl ChartResult {
    /// First daily close with its bar timestamp, if the series has one.
    pub fn first_close(&self) -> Option<(f64, Option<i64>)> {
        let quote = self.indicators.as_ref()?.quote.first()?;
        quote
            .close
            .iter()
            .enumerate()
            .find_map(|(i, c)| c.map(|price| (price, self.timestamp.get(i).copied())))
    }
}
