use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    error::{Result, WeatherError},
    model::{MoonPhaseData, WeatherData, WeatherRequest},
};

use super::WeatherProvider;

pub const DEFAULT_SERVICE_URL: &str = "https://wttr.in";

/// Text wttr.in answers with when it cannot resolve a location.
pub const UNKNOWN_LOCATION_MARKER: &str = "Unknown location; please try";

const MOON_ICONS: [(&str, &str); 8] = [
    ("new moon", "🌑"),
    ("waxing crescent", "🌒"),
    ("first quarter", "🌓"),
    ("waxing gibbous", "🌔"),
    ("full moon", "🌕"),
    ("waning gibbous", "🌖"),
    ("last quarter", "🌗"),
    ("waning crescent", "🌘"),
];

#[derive(Debug, Clone)]
pub struct WttrInProvider {
    base_url: Url,
    http: Client,
}

impl WttrInProvider {
    pub fn new(http: Client, service_url: &str) -> Result<Self> {
        let base_url = Url::parse(service_url).map_err(|e| {
            WeatherError::Fetch(format!("invalid weather service URL '{service_url}': {e}"))
        })?;
        Ok(Self { base_url, http })
    }

    /// `<base>/<path>?lang=..&<units>` plus any `extra` pairs.
    ///
    /// The unit flag is value-less (`?m`, not `?m=`).
    fn build_url(&self, path: &str, request: &WeatherRequest, extra: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty();
            if !path.is_empty() {
                segments.push(path);
            }
        }

        let has_query = request.language.is_some() || request.units.is_some() || !extra.is_empty();
        if has_query {
            let mut query = url.query_pairs_mut();
            if let Some(language) = &request.language {
                query.append_pair("lang", language);
            }
            if let Some(units) = request.units {
                query.append_key_only(units.as_str());
            }
            for (key, value) in extra {
                query.append_pair(key, value);
            }
        }
        url
    }

    fn root_url(&self, extra: &[(&str, &str)]) -> Url {
        self.build_url("", &WeatherRequest::default(), extra)
    }
}

#[derive(Debug, Deserialize)]
struct J1Response {
    weather: Vec<J1Day>,
}

#[derive(Debug, Deserialize)]
struct J1Day {
    astronomy: Vec<J1Astronomy>,
}

#[derive(Debug, Deserialize)]
struct J1Astronomy {
    moon_phase: String,
    moon_illumination: String,
}

#[async_trait]
impl WeatherProvider for WttrInProvider {
    fn name(&self) -> &'static str {
        "wttr.in"
    }

    fn supports_images(&self) -> bool {
        true
    }

    async fn get_weather(&self, request: &WeatherRequest) -> Result<WeatherData> {
        let url = self.build_url(&request.location, request, &[("format", "3")]);
        debug!(%url, "requesting one-line weather");

        let res = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| WeatherError::Fetch(format!("failed to reach wttr.in: {e}")))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| WeatherError::Fetch(format!("failed to read wttr.in response: {e}")))?;

        // wttr.in reports unresolvable locations with an error status; the
        // text is still worth showing.
        if !status.is_success() && !body.contains(UNKNOWN_LOCATION_MARKER) {
            return Err(WeatherError::Fetch(format!(
                "wttr.in request failed with status {}: {}",
                status,
                truncate_body(&body),
            )));
        }

        let (location, condition) = split_one_line(&body, &request.location);
        let condition = if request.show_plus_sign {
            condition
        } else {
            strip_temperature_plus(&condition)
        };

        let provider_link = self.build_url(&request.location, request, &[]).to_string();

        Ok(WeatherData {
            location,
            temperature: String::new(),
            condition,
            provider_link: Some(provider_link),
            ..Default::default()
        })
    }

    async fn get_weather_image(&self, request: &WeatherRequest) -> Option<Vec<u8>> {
        let url = self.build_url(&format!("{}.png", request.location), request, &[]);
        debug!(%url, "requesting weather image");

        let res = match self.http.get(url).send().await {
            Ok(res) => res,
            Err(e) => {
                warn!(error = %e, "weather image request failed");
                return None;
            }
        };

        if !res.status().is_success() {
            warn!(status = %res.status(), "weather image not available");
            return None;
        }

        match res.bytes().await {
            Ok(bytes) => Some(bytes.to_vec()),
            Err(e) => {
                warn!(error = %e, "failed to read weather image body");
                None
            }
        }
    }

    async fn get_moon_phase(&self) -> Result<MoonPhaseData> {
        let url = self.root_url(&[("format", "j1")]);
        debug!(%url, "requesting moon phase");

        let res = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| WeatherError::Fetch(format!("failed to reach wttr.in: {e}")))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| WeatherError::Fetch(format!("failed to read wttr.in response: {e}")))?;

        if !status.is_success() {
            return Err(WeatherError::Fetch(format!(
                "wttr.in request failed with status {}: {}",
                status,
                truncate_body(&body),
            )));
        }

        let parsed: J1Response = serde_json::from_str(&body)
            .map_err(|e| WeatherError::MalformedResponse(format!("moon phase JSON: {e}")))?;

        let astronomy = parsed
            .weather
            .into_iter()
            .next()
            .and_then(|day| day.astronomy.into_iter().next())
            .ok_or_else(|| {
                WeatherError::MalformedResponse("no astronomy data in response".to_string())
            })?;

        let icon = moon_icon(&astronomy.moon_phase).map(str::to_string);

        Ok(MoonPhaseData {
            phase: astronomy.moon_phase,
            illumination: astronomy.moon_illumination,
            icon,
        })
    }
}

/// Split `"<Location>: <condition>"` at the first colon.
///
/// Without a colon the whole body is the condition and `requested` is used
/// as the label.
fn split_one_line(body: &str, requested: &str) -> (String, String) {
    match body.split_once(':') {
        Some((label, rest)) => (label.trim().to_string(), rest.trim().to_string()),
        None => (requested.to_string(), body.trim().to_string()),
    }
}

/// Drop `+` signs from the temperature segment, i.e. everything before the
/// first comma. The rest of the text is left alone.
fn strip_temperature_plus(condition: &str) -> String {
    match condition.split_once(',') {
        Some((temperature, rest)) => format!("{},{}", temperature.replace('+', ""), rest),
        None => condition.replace('+', ""),
    }
}

fn moon_icon(phase: &str) -> Option<&'static str> {
    let phase = phase.trim().to_lowercase();
    MOON_ICONS
        .iter()
        .find(|(name, _)| *name == phase)
        .map(|(_, icon)| *icon)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
