use application::ports::{Backend, ensure_key, ensure_value};
use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use shared::{Context, Error, Result, TtlSeconds};
use std::fmt::Debug;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Clone)]
struct Entry {
    value: Arc<str>,
    ttl: Option<Duration>,
}

/// Expires each entry after its own TTL.
struct PerEntryTtl;

impl Expiry<String, Entry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        value.ttl
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        value.ttl
    }
}

/// Moka-based in-process backend.
/// Lock-free and concurrent, with an optional entry bound and per-entry TTL.
pub struct MokaCache {
    cache: Cache<String, Entry>,
    default_ttl: Option<Duration>,
}

impl MokaCache {
    /// Create an unbounded cache. Writes with `TtlSeconds(0)` fall back to
    /// `default_ttl`, and never expire when that is `None` too.
    pub fn new_unbounded(default_ttl: Option<Duration>) -> Self {
        Self::new(None, default_ttl)
    }

    pub fn new_bounded(max_entries: u64, default_ttl: Option<Duration>) -> Self {
        Self::new(Some(max_entries), default_ttl)
    }

    pub fn new(max_entries: Option<u64>, default_ttl: Option<Duration>) -> Self {
        let mut builder = Cache::builder().name("payload-cache").expire_after(PerEntryTtl);

        if let Some(capacity) = max_entries {
            builder = builder.max_capacity(capacity);
        }

        Self {
            cache: builder.build(),
            default_ttl,
        }
    }
}

#[async_trait]
impl Backend for MokaCache {
    async fn get(&self, ctx: &Context, key: &str) -> Result<String> {
        ensure_key(key)?;

        ctx.run(async {
            match self.cache.get(key).await {
                // Empty values are indistinguishable from missing ones
                Some(entry) if !entry.value.is_empty() => Ok(entry.value.to_string()),
                _ => Err(Error::NotFound), // Either doesn't exist or TTL expired
            }
        })
        .await
    }

    async fn put(&self, ctx: &Context, key: &str, value: &str, ttl: TtlSeconds) -> Result<()> {
        ensure_key(key)?;
        ensure_value(value)?;

        let entry = Entry {
            value: Arc::from(value),
            ttl: ttl.as_duration().or(self.default_ttl),
        };
        debug!("memory put {} ttl={:?}", key, entry.ttl);

        ctx.run(async {
            self.cache.insert(key.to_string(), entry).await;
            Ok(())
        })
        .await
    }
}

impl Debug for MokaCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaCache")
            .field("entry_count", &self.cache.entry_count())
            .field("weighted_size", &self.cache.weighted_size())
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}
