use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};
use tokio::{fs, sync::Mutex};
use tracing::{debug, info};

use crate::error::{Result, WeatherError};

use super::{PreferenceKey, PreferenceStore, PreferenceValue, UserPreference};

/// On-disk layout:
///
/// ```toml
/// [users."@alice:example.org"]
/// units = "m"
/// show_image = true
/// ```
#[derive(Debug, Default, Serialize, Deserialize)]
struct PreferencesFile {
    #[serde(default)]
    users: BTreeMap<String, UserPreference>,
}

/// Preferences kept in a single TOML file.
///
/// Every read-modify-write runs under one lock and the file is replaced via
/// rename, so concurrent writers end up last-write-wins.
#[derive(Debug)]
pub struct TomlPreferenceStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl TomlPreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<PreferencesFile> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(PreferencesFile::default());
            }
            Err(e) => {
                return Err(WeatherError::Store(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )));
            }
        };

        toml::from_str(&contents).map_err(|e| {
            WeatherError::Store(format!("failed to parse {}: {e}", self.path.display()))
        })
    }

    async fn write(&self, file: &PreferencesFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                WeatherError::Store(format!("failed to create {}: {e}", parent.display()))
            })?;
        }

        let toml = toml::to_string_pretty(file)
            .map_err(|e| WeatherError::Store(format!("failed to serialize preferences: {e}")))?;

        let tmp = self.path.with_extension("toml.tmp");
        fs::write(&tmp, toml)
            .await
            .map_err(|e| WeatherError::Store(format!("failed to write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, &self.path).await.map_err(|e| {
            WeatherError::Store(format!("failed to replace {}: {e}", self.path.display()))
        })?;

        debug!(path = %self.path.display(), users = file.users.len(), "wrote preferences file");
        Ok(())
    }
}

#[async_trait]
impl PreferenceStore for TomlPreferenceStore {
    async fn get(&self, user_id: &str) -> Result<Option<UserPreference>> {
        let _guard = self.lock.lock().await;
        let file = self.read().await?;

        Ok(file.users.get(user_id).cloned().map(|mut row| {
            row.user_id = user_id.to_string();
            row
        }))
    }

    async fn save(&self, user_id: &str, key: &str, value: PreferenceValue) -> Result<()> {
        let key = PreferenceKey::try_from(key)?;

        let _guard = self.lock.lock().await;
        let mut file = self.read().await?;

        let mut row = file
            .users
            .get(user_id)
            .cloned()
            .unwrap_or_else(|| UserPreference::new(user_id));
        row.set(key, value)?;
        file.users.insert(user_id.to_string(), row);

        self.write(&file).await?;
        info!(user_id, %key, "saved preference");
        Ok(())
    }

    async fn clear(&self, user_id: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut file = self.read().await?;

        if file.users.remove(user_id).is_some() {
            self.write(&file).await?;
        }
        info!(user_id, "cleared preferences");
        Ok(())
    }
}
