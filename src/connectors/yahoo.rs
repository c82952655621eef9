// src/connectors/yahoo.rs
use crate::config::MarketConfig;
use crate::connectors::messages::{ChartResponse, ChartResult};
use crate::connectors::traits::QuoteSource;
use crate::types::Quote;
use crate::utils::precision::normalize_price;
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{header, Client};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Daily-bar chart endpoint used as the paper desk's price feed.
pub struct YahooChartClient {
    http_client: Client,
    base_url: Url,
    price_tick: Decimal,
}

impl YahooChartClient {
    pub fn new(config: &MarketConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers({
                let mut headers = header::HeaderMap::new();
                headers.insert(
                    header::USER_AGENT,
                    header::HeaderValue::from_str(&config.user_agent)
                        .context("Invalid user agent")?,
                );
                headers
            })
            .build()
            .context("Failed to build HTTP client")?;

        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid market base url {}", config.base_url))?;

        Ok(Self {
            http_client,
            base_url,
            price_tick: config.price_tick,
        })
    }

    fn chart_url(&self, symbol: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("Market base url cannot be a base: {}", self.base_url))?
            .pop_if_empty()
            .extend(["v8", "finance", "chart", symbol]);

        let query = serde_urlencoded::to_string([("range", "1d"), ("interval", "1d")])?;
        url.set_query(Some(&query));
        Ok(url)
    }

    fn quote_from_chart(&self, symbol: &str, response: ChartResponse) -> Result<Quote> {
        if let Some(err) = response.chart.error {
            bail!("Quote for {} rejected: {} ({})", symbol, err.description, err.code);
        }

        let result: ChartResult = response
            .chart
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| anyhow!("No chart data for {}", symbol))?;

        let (raw_price, bar_time) = match result.first_close() {
            Some(close) => close,
            None => {
                warn!("No daily close for {}, using regular market price", symbol);
                let price = result
                    .meta
                    .regular_market_price
                    .ok_or_else(|| anyhow!("Failed to parse price for {}", symbol))?;
                (price, result.meta.regular_market_time)
            }
        };

        let price = Decimal::from_f64(raw_price)
            .ok_or_else(|| anyhow!("Price {} for {} is not a finite number", raw_price, symbol))?;

        Ok(Quote {
            symbol: result.meta.symbol,
            price: normalize_price(price, self.price_tick),
            currency: result.meta.currency,
            timestamp: bar_time.unwrap_or_else(|| Utc::now().timestamp()),
        })
    }
}

#[async_trait]
impl QuoteSource for YahooChartClient {
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote> {
        let url = self.chart_url(symbol)?;
        debug!("GET {}", url);

        // 404 still carries a chart.error body worth reporting
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Quote request for {} failed", symbol))?;
        let status = response.status();

        let body = response
            .json::<ChartResponse>()
            .await
            .with_context(|| format!("Unexpected quote payload for {} (HTTP {})", symbol, status))?;

        self.quote_from_chart(symbol, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn client(base_url: &str) -> YahooChartClient {
        YahooChartClient::new(&MarketConfig {
            base_url: base_url.to_string(),
            timeout_secs: 5,
            user_agent: "paper-desk-test".to_string(),
            price_tick: Decimal::from_str("0.0001").unwrap(),
        })
        .unwrap()
    }

    fn parse(json: &str) -> ChartResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn builds_chart_url() {
        let url = client("https://query1.finance.yahoo.com/").chart_url("AAPL").unwrap();
        assert_eq!(
            url.as_str(),
            "https://query1.finance.yahoo.com/v8/finance/chart/AAPL?range=1d&interval=1d"
        );

        let url = client("http://localhost:8080/proxy").chart_url("BRK-B").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/proxy/v8/finance/chart/BRK-B?range=1d&interval=1d"
        );
    }

    #[test]
    fn takes_first_daily_close() {
        let body = parse(
            r#"{"chart":{"result":[{"meta":{"symbol":"AAPL","currency":"USD","regularMarketPrice":190.5,"regularMarketTime":1700000999},
            "timestamp":[1700000000],
            "indicators":{"quote":[{"close":[189.30000305175781]}]}}],"error":null}}"#,
        );
        let quote = client("https://example.com").quote_from_chart("AAPL", body).unwrap();
        assert_eq!(quote.symbol, "AAPL");
        assert_eq!(quote.price, Decimal::from_str("189.3").unwrap());
        assert_eq!(quote.currency.as_deref(), Some("USD"));
        assert_eq!(quote.timestamp, 1700000000);
    }

    #[test]
    fn skips_null_bars_and_falls_back_to_meta() {
        let body = parse(
            r#"{"chart":{"result":[{"meta":{"symbol":"MSFT","regularMarketPrice":401.25,"regularMarketTime":1700000500},
            "timestamp":[1700000000],
            "indicators":{"quote":[{"close":[null]}]}}],"error":null}}"#,
        );
        let quote = client("https://example.com").quote_from_chart("MSFT", body).unwrap();
        assert_eq!(quote.price, Decimal::from_str("401.25").unwrap());
        assert_eq!(quote.timestamp, 1700000500);
    }

    #[test]
    fn chart_error_is_reported() {
        let body = parse(
            r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#,
        );
        let err = client("https://example.com")
            .quote_from_chart("ZZZZ", body)
            .unwrap_err();
        assert!(err.to_string().contains("ZZZZ"));
        assert!(err.to_string().contains("delisted"));
    }

    #[test]
    fn empty_result_is_an_error() {
        let body = parse(r#"{"chart":{"result":[],"error":null}}"#);
        assert!(client("https://example.com")
            .quote_from_chart("AAPL", body)
            .is_err());
    }
}
