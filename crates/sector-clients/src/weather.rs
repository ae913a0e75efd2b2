//! Weather report pass-through client
//!
//! Single-shot METAR/TAF lookups; no state, no retry.

use crate::error::{ClientError, ClientResult};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

const DEFAULT_WEATHER_URL: &str = "https://api.checkwx.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Kind of weather report to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// Current conditions
    Metar,
    /// Terminal forecast
    Taf,
}

impl ReportKind {
    /// URL path segment for this report kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Metar => "metar",
            ReportKind::Taf => "taf",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportKind::Metar => f.write_str("METAR"),
            ReportKind::Taf => f.write_str("TAF"),
        }
    }
}

/// Client for the weather lookup service.
pub struct WeatherClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    #[serde(default)]
    data: Vec<WeatherRecord>,
}

#[derive(Debug, Deserialize)]
struct WeatherRecord {
    raw_text: String,
}

impl WeatherClient {
    /// Client against the default weather API.
    pub fn new(api_key: impl Into<String>) -> ClientResult<Self> {
        Self::with_base_url(DEFAULT_WEATHER_URL, api_key)
    }

    /// Client against a specific base URL.
    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    /// Fetch the decoded report text for a station.
    pub async fn decoded(&self, station: &str, kind: ReportKind) -> ClientResult<String> {
        let station = station.trim().to_uppercase();
        let url = format!("{}/{}/{}/decoded", self.base_url, kind.as_str(), station);

        let response = self
            .client
            .get(&url)
            .header("X-API-Key", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
            });
        }

        let parsed: WeatherResponse = response.json().await?;
        parsed
            .data
            .into_iter()
            .next()
            .map(|record| record.raw_text)
            .ok_or(ClientError::NoData)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_kind_paths() {
        assert_eq!(ReportKind::Metar.as_str(), "metar");
        assert_eq!(ReportKind::Taf.as_str(), "taf");
        assert_eq!(ReportKind::Metar.to_string(), "METAR");
    }

    #[test]
    fn test_parse_weather_response() {
        let body = r#"{"results": 1, "data": [{"raw_text": "LTBA 241220Z 04008KT CAVOK 25/12 Q1016", "icao": "LTBA"}]}"#;
        let parsed: WeatherResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            parsed.data[0].raw_text,
            "LTBA 241220Z 04008KT CAVOK 25/12 Q1016"
        );
    }

    #[test]
    fn test_empty_data_is_no_data() {
        let body = r#"{"results": 0, "data": []}"#;
        let parsed: WeatherResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.data.is_empty());
    }
}
