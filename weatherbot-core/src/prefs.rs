//! Per-user preferences and how they layer over server defaults.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt};

use crate::{
    ServerConfig,
    error::{Result, WeatherError},
    model::Units,
    provider::ProviderRegistry,
};

pub mod memory;
pub mod toml_file;

pub use memory::MemoryPreferenceStore;
pub use toml_file::TomlPreferenceStore;

/// One user's stored overrides. `None` means "use the server default".
///
/// Every field is optional and defaulted, so rows written before a field
/// existed still deserialize.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPreference {
    /// Row key; kept outside the serialized body.
    #[serde(skip)]
    pub user_id: String,
    pub location: Option<String>,
    pub units: Option<Units>,
    pub language: Option<String>,
    pub provider: Option<String>,
    pub show_image: Option<bool>,
    /// Stored but not used by any command yet.
    pub show_forecast: Option<bool>,
    pub show_link: Option<bool>,
    pub show_plus_sign: Option<bool>,
}

impl UserPreference {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Default::default()
        }
    }

    /// Overwrite a single field.
    pub fn set(&mut self, key: PreferenceKey, value: PreferenceValue) -> Result<()> {
        match (key, value) {
            (PreferenceKey::Location, PreferenceValue::Text(v)) => self.location = Some(v),
            (PreferenceKey::Units, PreferenceValue::Text(v)) => {
                let units = Units::try_from(v.as_str()).map_err(|hint| {
                    WeatherError::InvalidPreferenceValue {
                        key: key.to_string(),
                        value: v.clone(),
                        hint,
                    }
                })?;
                self.units = Some(units);
            }
            (PreferenceKey::Language, PreferenceValue::Text(v)) => self.language = Some(v),
            (PreferenceKey::Provider, PreferenceValue::Text(v)) => self.provider = Some(v),
            (PreferenceKey::ShowImage, PreferenceValue::Flag(v)) => self.show_image = Some(v),
            (PreferenceKey::ShowForecast, PreferenceValue::Flag(v)) => self.show_forecast = Some(v),
            (PreferenceKey::ShowLink, PreferenceValue::Flag(v)) => self.show_link = Some(v),
            (PreferenceKey::ShowPlusSign, PreferenceValue::Flag(v)) => {
                self.show_plus_sign = Some(v)
            }
            (key, value) => {
                let hint = if key.is_flag() {
                    "Expected a true/false value."
                } else {
                    "Expected a text value."
                };
                return Err(WeatherError::InvalidPreferenceValue {
                    key: key.to_string(),
                    value: value.to_string(),
                    hint: hint.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreferenceKey {
    Location,
    Units,
    Language,
    Provider,
    ShowImage,
    ShowForecast,
    ShowLink,
    ShowPlusSign,
}

impl PreferenceKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            PreferenceKey::Location => "location",
            PreferenceKey::Units => "units",
            PreferenceKey::Language => "language",
            PreferenceKey::Provider => "provider",
            PreferenceKey::ShowImage => "show_image",
            PreferenceKey::ShowForecast => "show_forecast",
            PreferenceKey::ShowLink => "show_link",
            PreferenceKey::ShowPlusSign => "show_plus_sign",
        }
    }

    pub const fn all() -> &'static [PreferenceKey] {
        &[
            PreferenceKey::Location,
            PreferenceKey::Units,
            PreferenceKey::Language,
            PreferenceKey::Provider,
            PreferenceKey::ShowImage,
            PreferenceKey::ShowForecast,
            PreferenceKey::ShowLink,
            PreferenceKey::ShowPlusSign,
        ]
    }

    pub fn is_flag(&self) -> bool {
        matches!(
            self,
            PreferenceKey::ShowImage
                | PreferenceKey::ShowForecast
                | PreferenceKey::ShowLink
                | PreferenceKey::ShowPlusSign
        )
    }
}

impl fmt::Display for PreferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for PreferenceKey {
    type Error = WeatherError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        PreferenceKey::all()
            .iter()
            .copied()
            .find(|key| key.as_str() == value)
            .ok_or_else(|| WeatherError::InvalidPreferenceKey {
                key: value.to_string(),
                valid: PreferenceKey::all()
                    .iter()
                    .map(PreferenceKey::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreferenceValue {
    Text(String),
    Flag(bool),
}

impl fmt::Display for PreferenceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreferenceValue::Text(v) => f.write_str(v),
            PreferenceValue::Flag(v) => write!(f, "{v}"),
        }
    }
}

/// `1`, `true`, `yes` and `on` (any case) are true; anything else is false.
pub fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceSource {
    User,
    ServerDefault,
}

impl fmt::Display for PreferenceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreferenceSource::User => f.write_str("your setting"),
            PreferenceSource::ServerDefault => f.write_str("server default"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Effective<T> {
    pub value: T,
    pub source: PreferenceSource,
}

impl<T> Effective<T> {
    fn server(value: T) -> Self {
        Self {
            value,
            source: PreferenceSource::ServerDefault,
        }
    }

    fn overlay(&mut self, user: Option<T>) {
        if let Some(value) = user {
            self.value = value;
            self.source = PreferenceSource::User;
        }
    }
}

/// Server defaults with a user's overrides applied. Built per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectivePreferences {
    pub location: Effective<String>,
    pub units: Effective<Option<Units>>,
    pub language: Effective<Option<String>>,
    pub provider: Effective<String>,
    pub show_image: Effective<bool>,
    pub show_link: Effective<bool>,
    pub show_plus_sign: Effective<bool>,
}

impl EffectivePreferences {
    /// Overlay `row` on `config`.
    ///
    /// Empty stored strings count as unset. A stored provider only wins when
    /// `is_available` accepts it.
    pub fn merge(
        config: &ServerConfig,
        row: Option<&UserPreference>,
        is_available: impl Fn(&str) -> bool,
    ) -> Self {
        let mut prefs = Self {
            location: Effective::server(config.default_location.clone()),
            units: Effective::server(config.default_units),
            language: Effective::server(
                config.default_language.clone().filter(|l| !l.is_empty()),
            ),
            provider: Effective::server(config.weather_provider.clone()),
            show_image: Effective::server(config.show_image),
            show_link: Effective::server(config.show_link),
            show_plus_sign: Effective::server(config.show_plus_sign),
        };

        let Some(row) = row else {
            return prefs;
        };

        prefs.location.overlay(non_empty(&row.location));
        prefs.units.overlay(row.units.map(Some));
        prefs.language.overlay(non_empty(&row.language).map(Some));
        prefs
            .provider
            .overlay(non_empty(&row.provider).filter(|name| is_available(name)));
        prefs.show_image.overlay(row.show_image);
        prefs.show_link.overlay(row.show_link);
        prefs.show_plus_sign.overlay(row.show_plus_sign);
        prefs
    }

    /// `(name, rendered value, source)` for every field, in display order.
    pub fn entries(&self) -> Vec<(&'static str, String, PreferenceSource)> {
        let or_none = |v: Option<String>| v.unwrap_or_else(|| "(none)".to_string());
        vec![
            (
                "location",
                if self.location.value.is_empty() {
                    "(auto)".to_string()
                } else {
                    self.location.value.clone()
                },
                self.location.source,
            ),
            (
                "units",
                or_none(self.units.value.map(|u| u.to_string())),
                self.units.source,
            ),
            ("language", or_none(self.language.value.clone()), self.language.source),
            ("provider", self.provider.value.clone(), self.provider.source),
            ("show_image", self.show_image.value.to_string(), self.show_image.source),
            ("show_link", self.show_link.value.to_string(), self.show_link.source),
            (
                "show_plus_sign",
                self.show_plus_sign.value.to_string(),
                self.show_plus_sign.source,
            ),
        ]
    }
}

fn non_empty(field: &Option<String>) -> Option<String> {
    field.clone().filter(|s| !s.is_empty())
}

/// Keyed storage for [`UserPreference`] rows.
#[async_trait]
pub trait PreferenceStore: Send + Sync + fmt::Debug {
    async fn get(&self, user_id: &str) -> Result<Option<UserPreference>>;

    /// Upsert one field of the user's row.
    async fn save(&self, user_id: &str, key: &str, value: PreferenceValue) -> Result<()>;

    /// Delete the user's row. Succeeds when there is none.
    async fn clear(&self, user_id: &str) -> Result<()>;

    async fn load_with_defaults(
        &self,
        user_id: &str,
        config: &ServerConfig,
        providers: &ProviderRegistry,
    ) -> Result<EffectivePreferences> {
        let row = self.get(user_id).await?;
        Ok(EffectivePreferences::merge(config, row.as_ref(), |name| {
            providers.contains(name)
        }))
    }
}
