use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;

use crate::error::Result;

use super::{PreferenceKey, PreferenceStore, PreferenceValue, UserPreference};

/// Process-local store; rows are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    rows: RwLock<HashMap<String, UserPreference>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PreferenceStore for MemoryPreferenceStore {
    async fn get(&self, user_id: &str) -> Result<Option<UserPreference>> {
        Ok(self.rows.read().await.get(user_id).cloned())
    }

    async fn save(&self, user_id: &str, key: &str, value: PreferenceValue) -> Result<()> {
        let key = PreferenceKey::try_from(key)?;

        let mut rows = self.rows.write().await;
        let mut row = rows
            .get(user_id)
            .cloned()
            .unwrap_or_else(|| UserPreference::new(user_id));
        row.set(key, value)?;
        rows.insert(user_id.to_string(), row);

        info!(user_id, %key, "saved preference");
        Ok(())
    }

    async fn clear(&self, user_id: &str) -> Result<()> {
        self.rows.write().await.remove(user_id);
        info!(user_id, "cleared preferences");
        Ok(())
    }
}
