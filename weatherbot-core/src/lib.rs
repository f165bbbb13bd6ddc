//! Core library for the weather chat bot.
//!
//! This crate defines:
//! - Inline option parsing for free-text locations
//! - Abstraction over weather providers (wttr.in and an offline test provider)
//! - Per-user preference storage layered over server defaults
//! - Formatting of provider data into chat messages
//! - Command handlers tying the above together
//!
//! Routing chat messages to commands is left to the host; `weatherbot-cli`
//! is one such host.

pub mod bot;
pub mod config;
pub mod error;
pub mod formatters;
pub mod location;
pub mod model;
pub mod prefs;
pub mod provider;

pub use bot::WeatherBot;
pub use config::ServerConfig;
pub use error::WeatherError;
pub use location::{ParsedLocation, parse_location};
pub use model::{MoonPhaseData, Reply, Units, WeatherData, WeatherRequest};
pub use prefs::{
    EffectivePreferences, MemoryPreferenceStore, PreferenceSource, PreferenceStore,
    TomlPreferenceStore, UserPreference,
};
pub use provider::{ProviderId, ProviderRegistry, WeatherProvider};
