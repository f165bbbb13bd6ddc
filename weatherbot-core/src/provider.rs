use crate::{
    ServerConfig,
    error::{Result, WeatherError},
    model::{MoonPhaseData, WeatherData, WeatherRequest},
    provider::{test::TestProvider, wttr_in::WttrInProvider},
};
use async_trait::async_trait;
use reqwest::Client;
use std::{collections::HashMap, convert::TryFrom, fmt::Debug};

pub mod wttr_in;

const USER_AGENT: &str = concat!("weatherbot/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    WttrIn,
    Test,
}

impl ProviderId {
    /// Used when a requested provider is not registered.
    pub const PRIMARY: ProviderId = ProviderId::WttrIn;

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::WttrIn => "wttr.in",
            ProviderId::Test => "test",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::WttrIn, ProviderId::Test]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = WeatherError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "wttr.in" => Ok(ProviderId::WttrIn),
            "test" => Ok(ProviderId::Test),
            _ => Err(WeatherError::UnknownProvider {
                name: value.to_string(),
                available: provider_list(),
            }),
        }
    }
}

fn provider_list() -> String {
    ProviderId::all().iter().map(ProviderId::as_str).collect::<Vec<_>>().join(", ")
}

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Stable identifier used for selection and display.
    fn name(&self) -> &'static str;

    fn supports_images(&self) -> bool {
        false
    }

    async fn get_weather(&self, request: &WeatherRequest) -> Result<WeatherData>;

    /// Rendered forecast image, or `None` when unavailable for any reason.
    async fn get_weather_image(&self, request: &WeatherRequest) -> Option<Vec<u8>>;

    async fn get_moon_phase(&self) -> Result<MoonPhaseData>;
}

/// Name-keyed table of the providers the bot can use.
#[derive(Debug)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderId, Box<dyn WeatherProvider>>,
}

impl ProviderRegistry {
    /// Build every known provider, pointing wttr.in at `config.service_url`.
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let http = Client::builder().user_agent(USER_AGENT).build()?;

        let mut providers: HashMap<ProviderId, Box<dyn WeatherProvider>> = HashMap::new();
        for id in ProviderId::all() {
            let boxed: Box<dyn WeatherProvider> = match id {
                ProviderId::WttrIn => {
                    Box::new(WttrInProvider::new(http.clone(), &config.service_url)?)
                }
                ProviderId::Test => Box::new(TestProvider),
            };
            providers.insert(*id, boxed);
        }

        Ok(Self { providers })
    }

    /// Provider registered under `name`, if any.
    pub fn get(&self, name: &str) -> Option<&dyn WeatherProvider> {
        let id = ProviderId::try_from(name).ok()?;
        self.providers.get(&id).map(|p| p.as_ref())
    }

    /// Provider registered under `name`, falling back to the primary provider.
    pub fn resolve(&self, name: &str) -> &dyn WeatherProvider {
        self.get(name).unwrap_or_else(|| self.primary())
    }

    /// `from_config` registers every `ProviderId`, so the primary is always present.
    pub fn primary(&self) -> &dyn WeatherProvider {
        self.providers[&ProviderId::PRIMARY].as_ref()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered names in declaration order.
    pub fn names(&self) -> Vec<&'static str> {
        ProviderId::all()
            .iter()
            .filter(|id| self.providers.contains_key(id))
            .map(ProviderId::as_str)
            .collect()
    }
}
