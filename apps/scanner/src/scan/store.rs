//! Analysis store — keeps each scan result, and each bulk run, under its own id.
//!
//! `AppState` holds an `Arc<dyn AnalysisStore>`. The in-memory backend is the
//! default; `RedisAnalysisStore` is used when `REDIS_URL` is configured so results
//! survive restarts and are shared between instances.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::analysis::Analysis;
use crate::models::bulk::BulkAnalysis;

#[async_trait]
pub trait AnalysisStore: Send + Sync {
    async fn put(&self, analysis: &Analysis) -> Result<(), AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<Analysis>, AppError>;

    async fn put_bulk(&self, bulk: &BulkAnalysis) -> Result<(), AppError>;

    async fn get_bulk(&self, id: Uuid) -> Result<Option<BulkAnalysis>, AppError>;
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory backend
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryAnalysisStore {
    analyses: RwLock<HashMap<Uuid, Analysis>>,
    bulk_runs: RwLock<HashMap<Uuid, BulkAnalysis>>,
}

impl InMemoryAnalysisStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AnalysisStore for InMemoryAnalysisStore {
    async fn put(&self, analysis: &Analysis) -> Result<(), AppError> {
        self.analyses
            .write()
            .await
            .insert(analysis.id, analysis.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Analysis>, AppError> {
        Ok(self.analyses.read().await.get(&id).cloned())
    }

    async fn put_bulk(&self, bulk: &BulkAnalysis) -> Result<(), AppError> {
        self.bulk_runs.write().await.insert(bulk.id, bulk.clone());
        Ok(())
    }

    async fn get_bulk(&self, id: Uuid) -> Result<Option<BulkAnalysis>, AppError> {
        Ok(self.bulk_runs.read().await.get(&id).cloned())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Redis backend
// ────────────────────────────────────────────────────────────────────────────

pub struct RedisAnalysisStore {
    client: redis::Client,
    ttl_secs: u64,
}

impl RedisAnalysisStore {
    pub fn new(client: redis::Client, ttl_secs: u64) -> Self {
        Self { client, ttl_secs }
    }

    async fn set_json<T: Serialize + Sync>(&self, key: String, value: &T) -> Result<(), AppError> {
        let payload = serde_json::to_string(value).map_err(|e| AppError::Store(e.to_string()))?;
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        redis::cmd("SET")
            .arg(&key)
            .arg(payload)
            .arg("EX")
            .arg(self.ttl_secs)
            .query_async::<_, ()>(&mut conn)
            .await?;
        debug!("Stored {key} (ttl {}s)", self.ttl_secs);
        Ok(())
    }

    async fn get_json<T: DeserializeOwned + Send>(&self, key: String) -> Result<Option<T>, AppError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let payload: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        payload
            .map(|json| serde_json::from_str(&json).map_err(|e| AppError::Store(e.to_string())))
            .transpose()
    }
}

fn redis_key(id: Uuid) -> String {
    format!("analysis:{id}")
}

fn redis_bulk_key(id: Uuid) -> String {
    format!("bulk:{id}")
}

#[async_trait]
impl AnalysisStore for RedisAnalysisStore {
    async fn put(&self, analysis: &Analysis) -> Result<(), AppError> {
        self.set_json(redis_key(analysis.id), analysis).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<Analysis>, AppError> {
        self.get_json(redis_key(id)).await
    }

    async fn put_bulk(&self, bulk: &BulkAnalysis) -> Result<(), AppError> {
        self.set_json(redis_bulk_key(bulk.id), bulk).await
    }

    async fn get_bulk(&self, id: Uuid) -> Result<Option<BulkAnalysis>, AppError> {
        self.get_json(redis_bulk_key(id)).await
    }
}
