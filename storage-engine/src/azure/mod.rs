//! Backend for a partitioned, master-key signed REST document store
//! (Azure DocumentDB / Cosmos DB SQL API).
//!
//! Documents live in one collection under `dbs/<database>/colls/<collection>`
//! and are sharded by a partition key derived from the cache key. Every
//! request carries a fresh `x-ms-date` and a signature computed over it.

pub mod partition;
pub mod signing;

use application::ports::{Backend, ensure_key, ensure_value};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use partition::{partition_key, partition_key_header};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde::{Deserialize, Serialize};
use shared::config::AzureConfig;
use shared::{Context, Error, Result, TtlSeconds};
use signing::{MasterKey, format_request_date};
use std::time::Duration;
use tracing::{debug, info};

const API_VERSION: &str = "2017-01-19";
const RESOURCE_TYPE: &str = "docs";
const PARTITION_KEY_HEADER: &str = "x-ms-documentdb-partitionkey";

const IDLE_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
// 15s write + 15s read
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Wall clock used for `x-ms-date`.
pub type Clock = fn() -> DateTime<Utc>;

/// Characters the store forbids in a document id. Each of them would also
/// change which resource the request path points at.
const RESERVED_ID_CHARS: [char; 4] = ['/', '\\', '?', '#'];

/// The stored document. Only [`CacheDocument::new`] builds one for writing,
/// so the partition key always matches the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct CacheDocument {
    pub(crate) id: String,
    #[serde(default)]
    pub(crate) value: String,
    #[serde(rename = "partition", default)]
    pub(crate) partition_key: String,
}

impl CacheDocument {
    pub(crate) fn new(id: &str, value: &str) -> Self {
        Self {
            id: id.to_string(),
            value: value.to_string(),
            partition_key: partition_key(id).to_string(),
        }
    }
}

pub struct AzureTableBackend {
    client: Client,
    account: String,
    key: MasterKey,
    uri: String,
    collection_link: String,
    clock: Clock,
}

impl AzureTableBackend {
    /// Backend for `https://<account>.documents.azure.com`.
    pub fn new(config: &AzureConfig) -> Result<Self> {
        let uri = format!("https://{}.documents.azure.com", config.account);
        Self::with_endpoint(config, uri)
    }

    /// Backend against an explicit base URI (emulator, proxy, tests).
    pub fn with_endpoint(config: &AzureConfig, uri: impl Into<String>) -> Result<Self> {
        let key = MasterKey::from_base64(&config.key)?;

        // Hyper's connector races IPv6 and IPv4 addresses, so dual-stack
        // hosts are dialled without extra setup.
        let client = Client::builder()
            .pool_idle_timeout(IDLE_CONNECTION_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Configuration(format!("failed to build http client: {e}")))?;

        let uri = uri.into().trim_end_matches('/').to_string();
        info!("New Azure client: account={} uri={}", config.account, uri);

        Ok(Self {
            client,
            account: config.account.clone(),
            key,
            uri,
            collection_link: format!("dbs/{}/colls/{}", config.database, config.collection),
            clock: Utc::now,
        })
    }

    /// Replace the wall clock. Signatures are only accepted by the real
    /// service within its clock-skew window, so this is for tests.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    fn document_link(&self, key: &str) -> String {
        format!("{}/docs/{}", self.collection_link, key)
    }

    /// Sign and issue one request, reading the whole response within the
    /// context deadline.
    ///
    /// `resource_link` is what gets signed: the document itself for reads,
    /// the parent collection for creates.
    async fn send(
        &self,
        ctx: &Context,
        method: Method,
        path: &str,
        resource_link: &str,
        partition_key: &str,
        body: Option<Vec<u8>>,
    ) -> Result<(StatusCode, Vec<u8>)> {
        let date = format_request_date((self.clock)());
        let authorization = self
            .key
            .sign(method.as_str(), RESOURCE_TYPE, resource_link, &date);

        let mut request = self
            .client
            .request(method, format!("{}/{}", self.uri, path))
            .header("x-ms-date", date)
            .header("x-ms-version", API_VERSION)
            .header(AUTHORIZATION, authorization)
            .header(PARTITION_KEY_HEADER, partition_key_header(partition_key));

        if let Some(body) = body {
            request = request.header(CONTENT_TYPE, "application/json").body(body);
        }
        if let Some(remaining) = ctx.remaining() {
            request = request.timeout(remaining);
        }

        ctx.run(async {
            let response = request.send().await.map_err(transport_error)?;
            let status = response.status();
            let body = response.bytes().await.map_err(transport_error)?;
            Ok((status, body.to_vec()))
        })
        .await
    }
}

fn is_addressable(key: &str) -> bool {
    !key.contains(RESERVED_ID_CHARS)
}

fn transport_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout
    } else {
        Error::Transport(err.to_string())
    }
}

#[async_trait]
impl Backend for AzureTableBackend {
    async fn get(&self, ctx: &Context, key: &str) -> Result<String> {
        ensure_key(key)?;
        if !is_addressable(key) {
            // No such document can have been created
            debug!("Key not found: {} is not a valid document id", key);
            return Err(Error::NotFound);
        }

        // Reads are signed against the full document path
        let resource_link = self.document_link(key);
        let (status, body) = self
            .send(
                ctx,
                Method::GET,
                &resource_link,
                &resource_link,
                partition_key(key),
                None,
            )
            .await?;

        if status == StatusCode::NOT_FOUND {
            debug!("Key not found: {}", key);
            return Err(Error::NotFound);
        }
        if !status.is_success() {
            debug!("GET {} failed with status {}", key, status);
            return Err(Error::Transport(format!("remote store returned {status}")));
        }

        let document: CacheDocument = serde_json::from_slice(&body).map_err(|e| {
            debug!("Failed to decode response body into JSON: {}", e);
            Error::Decode(e.to_string())
        })?;

        if document.value.is_empty() {
            debug!("Response had empty value: {:?}", document);
            return Err(Error::NotFound);
        }

        Ok(document.value)
    }

    async fn put(&self, ctx: &Context, key: &str, value: &str, ttl: TtlSeconds) -> Result<()> {
        ensure_key(key)?;
        ensure_value(value)?;
        if !is_addressable(key) {
            return Err(Error::Validation(format!(
                "key must not contain any of {RESERVED_ID_CHARS:?}"
            )));
        }

        let document = CacheDocument::new(key, value);
        debug!(
            "POST partition key {} (ttl {:?} left to the collection)",
            document.partition_key, ttl
        );
        let body = serde_json::to_vec(&document)
            .map_err(|e| Error::Internal(format!("failed to encode document: {e}")))?;

        // Creates are signed against the parent collection
        let path = format!("{}/docs", self.collection_link);
        let (status, _) = self
            .send(
                ctx,
                Method::POST,
                &path,
                &self.collection_link,
                &document.partition_key,
                Some(body),
            )
            .await?;

        if !status.is_success() {
            debug!("POST {} failed with status {}", key, status);
            return Err(Error::Transport(format!("remote store returned {status}")));
        }
        Ok(())
    }
}

impl std::fmt::Debug for AzureTableBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureTableBackend")
            .field("account", &self.account)
            .field("uri", &self.uri)
            .field("collection_link", &self.collection_link)
            .finish()
    }
}
