// application/src/ports.rs
use async_trait::async_trait;
use shared::{Context, Error, Result, TtlSeconds};

/// The storage contract every backend adapter satisfies. Nothing above the
/// storage layer depends on a concrete backend.
///
/// Implementations must:
/// - reject an empty key (both calls) or an empty value (`put`) with
///   [`Error::Validation`] before any I/O;
/// - return [`Error::NotFound`] from `get` when the key is absent *or* the
///   stored value is empty;
/// - bound all I/O by the deadline carried in `ctx`, if any;
/// - never report success for a write the store did not acknowledge.
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    async fn get(&self, ctx: &Context, key: &str) -> Result<String>;
    async fn put(&self, ctx: &Context, key: &str, value: &str, ttl: TtlSeconds) -> Result<()>;
}

pub fn ensure_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::Validation("invalid key".into()));
    }
    Ok(())
}

pub fn ensure_value(value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::Validation("invalid value".into()));
    }
    Ok(())
}
