//! Request-scope keys for rate limiting and caching.
//!
//! A key is `namespace:scope:part...` with every part trimmed and empty parts
//! dropped. Identical inputs always produce byte-identical keys, which is
//! what lets an external limiter bucket repeated requests from one origin.

use std::borrow::Cow;
use std::net::IpAddr;

use axum::http::{HeaderMap, header::USER_AGENT};
use sha2::{Digest, Sha256};

/// Stand-in for client information the request does not carry.
pub const UNKNOWN: &str = "unknown";

const FORWARDED_FOR: &str = "x-forwarded-for";
const REAL_IP: &str = "x-real-ip";
const CF_CONNECTING_IP: &str = "cf-connecting-ip";

/// Hex chars of the user-agent digest kept in the fingerprint.
const FINGERPRINT_LEN: usize = 16;

/// One segment of a key: text or a number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPart<'a> {
    Text(Cow<'a, str>),
    Int(i64),
    UInt(u64),
}

impl<'a> From<&'a str> for KeyPart<'a> {
    fn from(value: &'a str) -> Self {
        KeyPart::Text(Cow::Borrowed(value))
    }
}

impl<'a> From<&'a String> for KeyPart<'a> {
    fn from(value: &'a String) -> Self {
        KeyPart::Text(Cow::Borrowed(value.as_str()))
    }
}

impl From<String> for KeyPart<'_> {
    fn from(value: String) -> Self {
        KeyPart::Text(Cow::Owned(value))
    }
}

macro_rules! impl_key_part_int {
    ($variant:ident, $wide:ty, $($t:ty),+) => {
        $(
            impl From<$t> for KeyPart<'_> {
                fn from(value: $t) -> Self {
                    KeyPart::$variant(<$wide>::from(value))
                }
            }
        )+
    };
}

impl_key_part_int!(Int, i64, i8, i16, i32, i64);
impl_key_part_int!(UInt, u64, u8, u16, u32, u64);

impl From<usize> for KeyPart<'_> {
    fn from(value: usize) -> Self {
        KeyPart::UInt(value as u64)
    }
}

/// Join parts with `:` after trimming, skipping parts that end up empty.
///
/// ```
/// use sitegate_api::keys::build_key;
///
/// assert_eq!(build_key(["contact", "form", "user@example.com"]), "contact:form:user@example.com");
/// assert_eq!(build_key(["contact", "", "lead"]), "contact:lead");
/// ```
pub fn build_key<'a, I, P>(parts: I) -> String
where
    I: IntoIterator<Item = P>,
    P: Into<KeyPart<'a>>,
{
    let mut key = String::new();
    for part in parts {
        let rendered: Cow<'_, str> = match part.into() {
            KeyPart::Text(text) => text,
            KeyPart::Int(n) => Cow::Owned(n.to_string()),
            KeyPart::UInt(n) => Cow::Owned(n.to_string()),
        };
        let trimmed = rendered.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !key.is_empty() {
            key.push(':');
        }
        key.push_str(trimmed);
    }
    key
}

/// Who a request appears to come from, as far as headers can tell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    /// Canonical client address, `:` replaced by `-` so it stays one key
    /// segment; [`UNKNOWN`] when no header names one.
    pub ip: String,

    /// Truncated SHA-256 of the user agent; [`UNKNOWN`] without one.
    pub fingerprint: String,
}

impl ClientIdentity {
    /// Total: missing, empty or non-UTF-8 headers degrade to the next source
    /// and finally to [`UNKNOWN`].
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let ip = header_str(headers, FORWARDED_FOR)
            .and_then(|chain| chain.split(',').map(str::trim).find(|hop| !hop.is_empty()))
            .or_else(|| header_str(headers, REAL_IP))
            .or_else(|| header_str(headers, CF_CONNECTING_IP))
            .map(canonical_ip)
            .unwrap_or_else(|| UNKNOWN.to_string());

        let fingerprint = header_str(headers, USER_AGENT.as_str())
            .map(fingerprint)
            .unwrap_or_else(|| UNKNOWN.to_string());

        Self { ip, fingerprint }
    }
}

/// `namespace:scope:ip:fingerprint:parts...`
pub fn build_scoped_key<'a, I, P>(
    namespace: &str,
    scope: &str,
    headers: &HeaderMap,
    parts: I,
) -> String
where
    I: IntoIterator<Item = P>,
    P: Into<KeyPart<'a>>,
{
    let client = ClientIdentity::from_headers(headers);

    let mut all: Vec<KeyPart<'a>> = vec![
        KeyPart::from(namespace.to_string()),
        KeyPart::from(scope.to_string()),
        KeyPart::from(client.ip),
        KeyPart::from(client.fingerprint),
    ];
    all.extend(parts.into_iter().map(Into::<KeyPart<'a>>::into));
    build_key(all)
}

fn header_str<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn canonical_ip(raw: &str) -> String {
    let raw = raw.trim_start_matches('[').trim_end_matches(']').trim();
    if raw.is_empty() {
        return UNKNOWN.to_string();
    }
    match raw.parse::<IpAddr>() {
        Ok(IpAddr::V6(v6)) => match v6.to_ipv4_mapped() {
            Some(v4) => v4.to_string(),
            None => v6.to_string().replace(':', "-"),
        },
        Ok(IpAddr::V4(v4)) => v4.to_string(),
        Err(_) => raw.replace(':', "-"),
    }
}

fn fingerprint(user_agent: &str) -> String {
    let digest = Sha256::digest(user_agent.as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(FINGERPRINT_LEN);
    hex
}
