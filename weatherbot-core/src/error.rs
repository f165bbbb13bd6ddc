use thiserror::Error;

/// Errors produced by providers and preference stores.
///
/// Command handlers in [`crate::bot`] never surface these to the host; they
/// render them as chat text instead.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// The weather service could not be reached or answered with a
    /// non-success status.
    #[error("{0}")]
    Fetch(String),

    /// The weather service answered, but not with the shape we expected.
    #[error("unexpected response from weather service: {0}")]
    MalformedResponse(String),

    #[error("Unknown preference '{key}'. Valid options: {valid}")]
    InvalidPreferenceKey { key: String, valid: String },

    #[error("Invalid value '{value}' for '{key}'. {hint}")]
    InvalidPreferenceValue {
        key: String,
        value: String,
        hint: String,
    },

    #[error("Unknown provider: {name}. Available providers: {available}")]
    UnknownProvider { name: String, available: String },

    /// Reading or writing the preference backing store failed.
    #[error("preference store error: {0}")]
    Store(String),
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        WeatherError::Fetch(err.to_string())
    }
}

pub type Result<T, E = WeatherError> = std::result::Result<T, E>;
