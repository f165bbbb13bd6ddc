//! Command handlers. The chat host decides which one to call; each handler
//! returns the replies to post and never fails.

use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    ServerConfig,
    error::{Result, WeatherError},
    formatters::{format_moon_phase, format_weather},
    location::{ParsedLocation, parse_location},
    model::{Reply, WeatherRequest},
    prefs::{PreferenceKey, PreferenceStore, PreferenceValue, parse_flag},
    provider::{ProviderRegistry, wttr_in::UNKNOWN_LOCATION_MARKER},
};

const UNKNOWN_LOCATION_NOTE: &str = "\nNote: An 'unknown location' likely indicates an issue \
with wttr.in obtaining geolocation information. This issue will probably resolve itself, \
so sit tight and look out the window until it does.";

/// Options `pref <option> <value>` accepts.
const SETTABLE_PREFS: [PreferenceKey; 7] = [
    PreferenceKey::Location,
    PreferenceKey::Units,
    PreferenceKey::Language,
    PreferenceKey::ShowImage,
    PreferenceKey::ShowLink,
    PreferenceKey::ShowPlusSign,
    PreferenceKey::Provider,
];

#[derive(Debug)]
pub struct WeatherBot {
    config: ServerConfig,
    providers: ProviderRegistry,
    prefs: Arc<dyn PreferenceStore>,
}

impl WeatherBot {
    pub fn new(
        config: ServerConfig,
        providers: ProviderRegistry,
        prefs: Arc<dyn PreferenceStore>,
    ) -> Self {
        Self {
            config,
            providers,
            prefs,
        }
    }

    /// Build the bot with every known provider.
    pub fn from_config(config: ServerConfig, prefs: Arc<dyn PreferenceStore>) -> Result<Self> {
        let providers = ProviderRegistry::from_config(&config)?;
        Ok(Self::new(config, providers, prefs))
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// `weather [<location>] [u:<unit>] [l:<lang>]`
    pub async fn weather(&self, sender: &str, raw: &str) -> Vec<Reply> {
        match self.try_weather(sender, raw).await {
            Ok(replies) => replies,
            Err(e) => {
                warn!(sender, error = %e, "weather command failed");
                vec![Reply::Text(format!("Error getting weather: {e}"))]
            }
        }
    }

    async fn try_weather(&self, sender: &str, raw: &str) -> Result<Vec<Reply>> {
        let prefs = self
            .prefs
            .load_with_defaults(sender, &self.config, &self.providers)
            .await?;
        let parsed = parse_location(raw);
        // A stored or default location may carry inline options of its own.
        let fallback = if parsed.location.is_some() {
            ParsedLocation::default()
        } else {
            parse_location(&prefs.location.value)
        };

        // Inline options beat stored preferences.
        let request = WeatherRequest {
            location: parsed.location.or(fallback.location).unwrap_or_default(),
            units: parsed.units.or(fallback.units).or(prefs.units.value),
            language: parsed.language.or(fallback.language).or(prefs.language.value),
            show_plus_sign: prefs.show_plus_sign.value,
        };

        let provider = self.providers.resolve(&prefs.provider.value);
        info!(sender, provider = provider.name(), location = %request.location, "fetching weather");

        let mut data = provider.get_weather(&request).await?;
        if !prefs.show_link.value {
            data.provider_link = None;
        }

        let mut message = format_weather(&data);
        if data.condition.contains(UNKNOWN_LOCATION_MARKER) {
            message.push_str(UNKNOWN_LOCATION_NOTE);
        }
        let mut replies = vec![Reply::Text(message)];

        if prefs.show_image.value && provider.supports_images() && !request.location.is_empty() {
            if let Some(image) = provider.get_weather_image(&request).await {
                replies.push(Reply::Image {
                    filename: format!("{}.png", request.location),
                    data: image,
                });
            }
        }

        Ok(replies)
    }

    /// `weather help`
    pub fn help(&self) -> Reply {
        let p = &self.config.command_prefix;
        Reply::Text(format!(
            "Get information about the weather.\n\n\
             If the location is not specified, the default location or IP address will be used.\n\
             Otherwise, location can be specified by name:\n\
             `{p}weather Chicago`\n\
             or by Airport Code:\n\
             `{p}weather SFO`\n\n\
             Units may be specified by adding `u:<unit>` to the location like:\n\
             `{p}weather Chicago u:m`\n\
             where `<unit>` is one of:\n\n\
             * `m`: metric;\n\
             * `u`: US;\n\
             * `M`: metric, but wind speed unit is m/s.\n\n\
             Forecast language can be specified by adding `l:<language-code>` like:\n\
             `{p}weather Chicago l:es`\n\n\
             Options can be combined: `{p}weather Chicago l:es u:M`.\n\n\
             To change the weather provider, use: `{p}weather provider <name>`\n\
             To see available providers, use: `{p}weather provider`\n\
             To set your own preferences, use: `{p}weather pref <option> <value>`\n\
             To view your preferences, use: `{p}weather pref`\n\
             To clear your preferences, use: `{p}weather pref clear`\n\
             To see the moon phase, use: `{p}moon`"
        ))
    }

    /// `weather provider [<name>]`
    pub async fn provider(&self, sender: &str, name: Option<&str>) -> Reply {
        let available = self.providers.names().join(", ");

        let Some(name) = name else {
            return match self
                .prefs
                .load_with_defaults(sender, &self.config, &self.providers)
                .await
            {
                Ok(prefs) => {
                    let current = self.providers.resolve(&prefs.provider.value).name();
                    Reply::Text(format!(
                        "Current provider: {current}\nAvailable providers: {available}"
                    ))
                }
                Err(e) => Reply::Text(format!("Error loading preferences: {e}")),
            };
        };

        let Some(provider) = self.providers.get(name) else {
            return Reply::Text(
                WeatherError::UnknownProvider {
                    name: name.to_string(),
                    available,
                }
                .to_string(),
            );
        };

        let canonical = provider.name();
        match self
            .prefs
            .save(
                sender,
                PreferenceKey::Provider.as_str(),
                PreferenceValue::Text(canonical.to_string()),
            )
            .await
        {
            Ok(()) => {
                info!(sender, provider = canonical, "provider switched");
                Reply::Text(format!("Weather provider set to {canonical} for you."))
            }
            Err(e) => Reply::Text(format!("Error saving preference: {e}")),
        }
    }

    /// `weather pref [<option> [<value>]]`
    pub async fn pref(&self, sender: &str, option: Option<&str>, value: Option<&str>) -> Reply {
        match self.try_pref(sender, option, value).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(sender, error = %e, "pref command failed");
                Reply::Text(e.to_string())
            }
        }
    }

    async fn try_pref(
        &self,
        sender: &str,
        option: Option<&str>,
        value: Option<&str>,
    ) -> Result<Reply> {
        let Some(option) = option else {
            let prefs = self
                .prefs
                .load_with_defaults(sender, &self.config, &self.providers)
                .await?;
            let lines = prefs
                .entries()
                .into_iter()
                .map(|(name, value, source)| format!("{name}: {value} ({source})"))
                .collect::<Vec<_>>()
                .join("\n");
            return Ok(Reply::Text(format!(
                "Your preferences (including defaults):\n{lines}"
            )));
        };

        if option == "clear" {
            self.prefs.clear(sender).await?;
            return Ok(Reply::text(
                "Your weather preferences have been cleared (server defaults will be used).",
            ));
        }

        let valid = SETTABLE_PREFS
            .iter()
            .map(PreferenceKey::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        let key = PreferenceKey::try_from(option)
            .ok()
            .filter(|key| SETTABLE_PREFS.contains(key))
            .ok_or_else(|| WeatherError::InvalidPreferenceKey {
                key: option.to_string(),
                valid,
            })?;

        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return Ok(Reply::Text(format!("Please provide a value for '{option}'.")));
        };

        let value = if key.is_flag() {
            PreferenceValue::Flag(parse_flag(value))
        } else if key == PreferenceKey::Provider {
            let provider =
                self.providers
                    .get(value)
                    .ok_or_else(|| WeatherError::UnknownProvider {
                        name: value.to_string(),
                        available: self.providers.names().join(", "),
                    })?;
            PreferenceValue::Text(provider.name().to_string())
        } else {
            PreferenceValue::Text(value.to_string())
        };

        self.prefs.save(sender, key.as_str(), value.clone()).await?;
        Ok(Reply::Text(format!("Preference '{key}' set to '{value}' for you.")))
    }

    /// `moon`
    pub async fn moon(&self, sender: &str) -> Reply {
        match self.try_moon(sender).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(sender, error = %e, "moon command failed");
                Reply::Text(format!("Error getting moon phase: {e}"))
            }
        }
    }

    async fn try_moon(&self, sender: &str) -> Result<Reply> {
        let prefs = self
            .prefs
            .load_with_defaults(sender, &self.config, &self.providers)
            .await?;
        let provider = self.providers.resolve(&prefs.provider.value);

        let moon = provider.get_moon_phase().await?;
        Ok(Reply::Text(format_moon_phase(&moon)))
    }
}
