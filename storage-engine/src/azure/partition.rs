/// Characters of the cache key that make up its partition key.
pub const PARTITION_KEY_LEN: usize = 4;

/// Shard token for a cache key: its first four characters, or the whole key
/// when it is shorter. Splits on character boundaries, never inside one.
pub fn partition_key(key: &str) -> &str {
    match key.char_indices().nth(PARTITION_KEY_LEN) {
        Some((end, _)) => &key[..end],
        None => key,
    }
}

/// `x-ms-documentdb-partitionkey` header value: a one-element JSON array.
/// Shorter keys just produce a shorter literal (`["ab"]`).
pub fn partition_key_header(partition_key: &str) -> String {
    serde_json::json!([partition_key]).to_string()
}
