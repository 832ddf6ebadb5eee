use crate::payload::{Payload, PutEntry};
use crate::ports::Backend;
use shared::{Context, Result};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

#[derive(Clone)]
pub struct PutUseCase {
    backend: Arc<dyn Backend>,
}
impl PutUseCase {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Store each entry under a freshly generated id and return the ids in
    /// request order. Stops at the first backend failure.
    pub async fn exec(&self, ctx: &Context, entries: Vec<PutEntry>) -> Result<Vec<String>> {
        let mut ids = Vec::with_capacity(entries.len());
        for entry in entries {
            let id = Uuid::new_v4().to_string();
            debug!("PUT {} ({})", id, entry.payload.kind.tag());
            self.backend
                .put(ctx, &id, &entry.payload.encode(), entry.ttl)
                .await?;
            ids.push(id);
        }
        Ok(ids)
    }
}

#[derive(Clone)]
pub struct GetUseCase {
    backend: Arc<dyn Backend>,
}
impl GetUseCase {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    pub async fn exec(&self, ctx: &Context, id: &str) -> Result<Payload> {
        let stored = self.backend.get(ctx, id).await?;
        Payload::decode(&stored)
    }
}
