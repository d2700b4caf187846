//! Yahoo Finance chart API provider.

use std::time::Duration;

use chrono::{DateTime, Days, NaiveDate, NaiveTime};
use reqwest::blocking::Client;
use reqwest::Url;
use serde::Deserialize;

use super::{check_range, PriceProvider, ProviderError, ProviderResult};
use crate::config::ProviderConfig;
use crate::types::PriceSeries;

/// Blocking HTTP client for the v8 chart endpoint.
///
/// Calls block the current thread; async callers should run them on a blocking pool.
#[derive(Debug, Clone)]
pub struct YahooProvider {
    base_url: Url,
    client: Client,
}

impl YahooProvider {
    /// Create a provider against `base_url` with the given request timeout.
    pub fn new(base_url: &str, timeout: Duration, user_agent: &str) -> ProviderResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ProviderError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ProviderError::InvalidUrl(base_url.to_string()));
        }
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { base_url, client })
    }

    pub fn from_config(config: &ProviderConfig) -> ProviderResult<Self> {
        Self::new(
            &config.base_url,
            Duration::from_secs(config.timeout_secs),
            &config.user_agent,
        )
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// The identifier is one percent-encoded path segment.
    fn chart_url(&self, identifier: &str, start: NaiveDate, end: NaiveDate) -> Url {
        // period2 is exclusive upstream; move it past `end` so the range is inclusive.
        let period1 = start.and_time(NaiveTime::MIN).and_utc().timestamp();
        let period2 = end
            .checked_add_days(Days::new(1))
            .unwrap_or(end)
            .and_time(NaiveTime::MIN)
            .and_utc()
            .timestamp();

        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["v8", "finance", "chart", identifier]);
        }
        url.query_pairs_mut()
            .append_pair("period1", &period1.to_string())
            .append_pair("period2", &period2.to_string())
            .append_pair("interval", "1d")
            .append_pair("events", "history");
        url
    }
}

impl PriceProvider for YahooProvider {
    fn get_prices(
        &self,
        identifier: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ProviderResult<PriceSeries> {
        check_range(start, end)?;

        let url = self.chart_url(identifier, start, end);
        let response = self.client.get(url).send()?.error_for_status()?;
        let body: ChartResponse = response.json()?;

        let prices = parse_chart(identifier, body)?;
        Ok(prices
            .range(start..=end)
            .map(|(date, price)| (*date, *price))
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
    #[serde(default)]
    adjclose: Vec<AdjClose>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

/// Adjusted closes when present, plain closes otherwise. Null points are skipped.
fn parse_chart(identifier: &str, body: ChartResponse) -> ProviderResult<PriceSeries> {
    if let Some(error) = body.chart.error {
        return Err(ProviderError::Malformed(format!(
            "{}: {} ({})",
            identifier, error.description, error.code
        )));
    }

    let result = body
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| ProviderError::NotFound(identifier.to_string()))?;

    let Indicators { quote, adjclose } = result.indicators;
    let closes = adjclose
        .into_iter()
        .next()
        .map(|a| a.adjclose)
        .filter(|a| !a.is_empty())
        .or_else(|| quote.into_iter().next().map(|q| q.close))
        .unwrap_or_default();

    if closes.len() != result.timestamp.len() {
        return Err(ProviderError::Malformed(format!(
            "{}: {} timestamps but {} prices",
            identifier,
            result.timestamp.len(),
            closes.len()
        )));
    }

    Ok(result
        .timestamp
        .iter()
        .zip(closes)
        .filter_map(|(ts, close)| {
            let date = DateTime::from_timestamp(*ts, 0)?.date_naive();
            close.map(|price| (date, price))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> ProviderResult<PriceSeries> {
        parse_chart("SPY", serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_parse_prefers_adjusted_close() {
        let prices = parse(
            r#"{"chart":{"result":[{
                "timestamp":[1704205800,1704292200,1704378600],
                "indicators":{
                    "quote":[{"close":[472.65,468.79,467.28]}],
                    "adjclose":[{"adjclose":[465.1,null,459.9]}]
                }}],"error":null}}"#,
        )
        .unwrap();

        assert_eq!(prices.len(), 2);
        let first = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(prices.get(&first), Some(&465.1));
    }

    #[test]
    fn test_parse_falls_back_to_close() {
        let prices = parse(
            r#"{"chart":{"result":[{
                "timestamp":[1704205800],
                "indicators":{"quote":[{"close":[472.65]}]}
            }],"error":null}}"#,
        )
        .unwrap();
        assert_eq!(prices.values().copied().collect::<Vec<_>>(), vec![472.65]);
    }

    #[test]
    fn test_parse_error_payload() {
        let result = parse(
            r#"{"chart":{"result":null,"error":{
                "code":"Not Found",
                "description":"No data found, symbol may be delisted"
            }}}"#,
        );
        assert!(matches!(result, Err(ProviderError::Malformed(msg)) if msg.contains("delisted")));
    }

    #[test]
    fn test_chart_url_is_inclusive() {
        let provider = YahooProvider::new(
            "https://query1.finance.yahoo.com/",
            Duration::from_secs(5),
            "test",
        )
        .unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let url = provider.chart_url("SPY", day, day);

        assert!(url
            .as_str()
            .starts_with("https://query1.finance.yahoo.com/v8/finance/chart/SPY?"));
        assert_eq!(
            url.query(),
            Some("period1=1704153600&period2=1704240000&interval=1d&events=history")
        );
    }

    #[test]
    fn test_chart_url_encodes_identifier() {
        let provider =
            YahooProvider::new("https://example.test/api", Duration::from_secs(5), "test").unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();

        let url = provider.chart_url("BRK/B", day, day);
        assert_eq!(url.path(), "/api/v8/finance/chart/BRK%2FB");

        let url = provider.chart_url("X?period1=0#", day, day);
        assert_eq!(url.path(), "/api/v8/finance/chart/X%3Fperiod1=0%23");
        assert!(url.query().unwrap().starts_with("period1=1704153600&"));
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        let result = YahooProvider::new("not a url", Duration::from_secs(5), "test");
        assert!(matches!(result, Err(ProviderError::InvalidUrl(_))));
    }
}
