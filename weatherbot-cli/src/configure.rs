use anyhow::{Context, Result};
use inquire::{Confirm, Select, Text};
use std::path::Path;
use weatherbot_core::{ProviderId, ServerConfig, Units};

const NO_UNITS: &str = "(service default)";

/// Walk through the server defaults and write them to `path`.
pub fn configure(path: &Path) -> Result<()> {
    let current = if path.exists() {
        ServerConfig::load_from(path)?
    } else {
        ServerConfig::default()
    };

    let default_location = Text::new("Default location:")
        .with_default(&current.default_location)
        .with_help_message("Leave empty to let the weather service geolocate")
        .prompt()
        .context("Failed to read default location")?;

    let mut unit_choices = vec![NO_UNITS];
    unit_choices.extend(Units::all().iter().map(Units::as_str));
    let start = current
        .default_units
        .and_then(|u| unit_choices.iter().position(|c| *c == u.as_str()))
        .unwrap_or(0);
    let units = Select::new("Default units (m: metric, u: US, M: metric with m/s):", unit_choices)
        .with_starting_cursor(start)
        .prompt()
        .context("Failed to read default units")?;
    let default_units = Units::try_from(units).ok();

    let language = Text::new("Default language code:")
        .with_default(current.default_language.as_deref().unwrap_or(""))
        .prompt()
        .context("Failed to read default language")?;

    let providers: Vec<&str> = ProviderId::all().iter().map(ProviderId::as_str).collect();
    let start = providers
        .iter()
        .position(|p| *p == current.weather_provider)
        .unwrap_or(0);
    let weather_provider = Select::new("Weather provider:", providers)
        .with_starting_cursor(start)
        .prompt()
        .context("Failed to read weather provider")?;

    let show_link = Confirm::new("Show a source link?")
        .with_default(current.show_link)
        .prompt()?;
    let show_image = Confirm::new("Send a weather image?")
        .with_default(current.show_image)
        .prompt()?;
    let show_plus_sign = Confirm::new("Keep '+' on positive temperatures?")
        .with_default(current.show_plus_sign)
        .prompt()?;

    let cfg = ServerConfig {
        default_location: default_location.trim().to_string(),
        default_units,
        default_language: Some(language.trim().to_string()).filter(|l| !l.is_empty()),
        show_link,
        show_image,
        show_plus_sign,
        weather_provider: weather_provider.to_string(),
        ..current
    };

    cfg.save_to(path)?;
    println!("Configuration saved to {}", path.display());
    Ok(())
}
