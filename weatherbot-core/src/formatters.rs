use crate::model::{MoonPhaseData, WeatherData};

/// Formats a weather report into a single chat message.
pub fn format_weather(data: &WeatherData) -> String {
    let mut output = if data.temperature.is_empty() {
        format!("{}: {}", data.location, data.condition)
    } else {
        format!("{}: {}, {}", data.location, data.temperature, data.condition)
    };

    if let Some(humidity) = present(&data.humidity) {
        output.push_str(&format!(", Humidity: {}", humidity));
    }
    if let Some(wind) = present(&data.wind) {
        output.push_str(&format!(", Wind: {}", wind));
    }
    if let Some(forecast) = present(&data.forecast) {
        output.push_str(&format!("\nForecast: {}", forecast));
    }
    if let Some(link) = present(&data.provider_link) {
        output.push_str(&format!(" ([source]({}))", link));
    }
    output
}

/// Formats moon phase data, e.g. `🌕 Full Moon (99% Illuminated)`.
pub fn format_moon_phase(data: &MoonPhaseData) -> String {
    match present(&data.icon) {
        Some(icon) => format!("{} {} ({}% Illuminated)", icon, data.phase, data.illumination),
        None => format!("{} ({}% Illuminated)", data.phase, data.illumination),
    }
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}
