//! Master-key request signing for the document store REST protocol.

use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use shared::{Error, Result};
use url::form_urlencoded;

type HmacSha256 = Hmac<Sha256>;

/// `x-ms-date` layout: RFC 1123 with a literal `GMT` zone.
const REQUEST_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Decoded account master key with the HMAC key schedule already prepared.
///
/// Decoding happens once, at construction. A key that is not valid base64
/// is rejected there instead of producing bad signatures later.
#[derive(Clone)]
pub struct MasterKey {
    mac: HmacSha256,
}

impl MasterKey {
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let decoded = STANDARD
            .decode(encoded.trim())
            .map_err(|e| Error::Configuration(format!("master key is not valid base64: {e}")))?;
        let mac = HmacSha256::new_from_slice(&decoded)
            .map_err(|e| Error::Configuration(format!("master key rejected: {e}")))?;
        Ok(Self { mac })
    }

    /// Compute the `Authorization` header value for one request.
    ///
    /// `resource_link` has no leading slash. `date` must be the exact
    /// `x-ms-date` header sent with the same request.
    pub fn sign(
        &self,
        verb: &str,
        resource_type: &str,
        resource_link: &str,
        date: &str,
    ) -> String {
        let payload = string_to_sign(verb, resource_type, resource_link, date);

        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        let signature = STANDARD.encode(mac.finalize().into_bytes());

        let token = format!("type=master&ver=1.0&sig={signature}");
        form_urlencoded::byte_serialize(token.as_bytes()).collect()
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MasterKey(<redacted>)")
    }
}

/// The trailing empty line is part of the protocol.
pub(crate) fn string_to_sign(
    verb: &str,
    resource_type: &str,
    resource_link: &str,
    date: &str,
) -> String {
    format!(
        "{}\n{}\n{}\n{}\n\n",
        verb.to_lowercase(),
        resource_type,
        resource_link,
        date.to_lowercase()
    )
}

pub fn format_request_date(at: DateTime<Utc>) -> String {
    at.format(REQUEST_DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // base64("test-master-key")
    const KEY: &str = "dGVzdC1tYXN0ZXIta2V5";
    const DATE: &str = "Tue, 14 Oct 2025 09:30:00 GMT";

    fn sign(verb: &str, kind: &str, link: &str, date: &str) -> String {
        MasterKey::from_base64(KEY).unwrap().sign(verb, kind, link, date)
    }

    #[test]
    fn test_request_date_format() {
        let at = Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap();
        assert_eq!(format_request_date(at), "Mon, 02 Jan 2006 15:04:05 GMT");
    }

    #[test]
    fn test_string_to_sign_layout() {
        assert_eq!(
            string_to_sign("POST", "docs", "dbs/prebidcache/colls/cache", DATE),
            "post\ndocs\ndbs/prebidcache/colls/cache\ntue, 14 oct 2025 09:30:00 gmt\n\n"
        );
    }

    #[test]
    fn test_signature_matches_hmac_of_canonical_string() {
        let token = sign("GET", "docs", "dbs/prebidcache/colls/cache/docs/abcdef", DATE);

        let decoded: String = form_urlencoded::parse(format!("auth={token}").as_bytes())
            .map(|(_, v)| v.into_owned())
            .collect();
        let signature = decoded
            .strip_prefix("type=master&ver=1.0&sig=")
            .expect("token prefix");

        let mut mac = HmacSha256::new_from_slice(b"test-master-key").unwrap();
        mac.update(b"get\ndocs\ndbs/prebidcache/colls/cache/docs/abcdef\n");
        mac.update(b"tue, 14 oct 2025 09:30:00 gmt\n\n");
        assert_eq!(signature, STANDARD.encode(mac.finalize().into_bytes()));
    }

    #[test]
    fn test_token_is_query_escaped() {
        let token = sign("GET", "docs", "dbs/a/colls/b", DATE);
        assert!(token.starts_with("type%3Dmaster%26ver%3D1.0%26sig%3D"));
        assert!(!token.contains('/'));
        assert!(!token.contains('='));
    }

    #[test]
    fn test_signature_is_deterministic() {
        let link = "dbs/prebidcache/colls/cache";
        assert_eq!(sign("POST", "docs", link, DATE), sign("POST", "docs", link, DATE));
        // verb and date are case-insensitive by construction
        assert_eq!(
            sign("post", "docs", link, DATE),
            sign("POST", "docs", link, &DATE.to_uppercase())
        );
    }

    #[test]
    fn test_signature_changes_with_each_input() {
        let base = sign("POST", "docs", "dbs/prebidcache/colls/cache", DATE);

        assert_ne!(base, sign("GET", "docs", "dbs/prebidcache/colls/cache", DATE));
        assert_ne!(base, sign("POST", "colls", "dbs/prebidcache/colls/cache", DATE));
        assert_ne!(base, sign("POST", "docs", "dbs/prebidcache/colls/cache/docs/abcd", DATE));
        let next_second = "Tue, 14 Oct 2025 09:30:01 GMT";
        assert_ne!(base, sign("POST", "docs", "dbs/prebidcache/colls/cache", next_second));

        let other_key = MasterKey::from_base64("b3RoZXIta2V5").unwrap();
        assert_ne!(base, other_key.sign("POST", "docs", "dbs/prebidcache/colls/cache", DATE));
    }

    #[test]
    fn test_malformed_key_is_configuration_error() {
        let err = MasterKey::from_base64("not base64!!").unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_debug_redacts_key() {
        let key = MasterKey::from_base64(KEY).unwrap();
        assert_eq!(format!("{key:?}"), "MasterKey(<redacted>)");
    }
}
