use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt};

/// Unit flag understood by the weather service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Units {
    /// `m`: metric.
    #[serde(rename = "m")]
    Metric,
    /// `u`: US customary.
    #[serde(rename = "u")]
    Us,
    /// `M`: metric, but wind speed in m/s.
    #[serde(rename = "M")]
    MetricWindMs,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "m",
            Units::Us => "u",
            Units::MetricWindMs => "M",
        }
    }

    pub const fn all() -> &'static [Units] {
        &[Units::Metric, Units::Us, Units::MetricWindMs]
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Units {
    type Error = String;

    // Case matters here: `m` and `M` are different flags.
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "m" => Ok(Units::Metric),
            "u" => Ok(Units::Us),
            "M" => Ok(Units::MetricWindMs),
            _ => Err(format!("Valid units: {}", units_list())),
        }
    }
}

pub(crate) fn units_list() -> String {
    Units::all().iter().map(Units::as_str).collect::<Vec<_>>().join(", ")
}

/// Arguments for a single weather or image lookup.
#[derive(Debug, Clone, Default)]
pub struct WeatherRequest {
    /// Location as typed by the user; empty lets the service geolocate.
    pub location: String,
    pub units: Option<Units>,
    pub language: Option<String>,
    pub show_plus_sign: bool,
}

/// Weather report normalized across providers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherData {
    pub location: String,
    /// Empty when the provider folds the temperature into `condition`.
    pub temperature: String,
    pub condition: String,
    pub humidity: Option<String>,
    pub wind: Option<String>,
    pub forecast: Option<String>,
    pub image_url: Option<String>,
    pub provider_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoonPhaseData {
    pub phase: String,
    /// Percentage as text, e.g. `"42"`.
    pub illumination: String,
    pub icon: Option<String>,
}

/// Something a command hands back to the chat host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Image { filename: String, data: Vec<u8> },
}

impl Reply {
    pub fn text(msg: impl Into<String>) -> Self {
        Reply::Text(msg.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Reply::Text(msg) => Some(msg),
            Reply::Image { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn units_as_str_roundtrip() {
        for units in Units::all() {
            let parsed = Units::try_from(units.as_str()).expect("roundtrip should succeed");
            assert_eq!(*units, parsed);
        }
    }

    #[test]
    fn units_are_case_sensitive() {
        assert_eq!(Units::try_from("M"), Ok(Units::MetricWindMs));
        let err = Units::try_from("U").unwrap_err();
        assert!(err.contains("m, u, M"));
    }
}
