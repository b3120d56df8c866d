//! Process configuration, read from the environment.

use std::net::SocketAddr;

use thiserror::Error;

pub const DEFAULT_BIND: &str = "0.0.0.0:8080";
pub const DEFAULT_RATE_LIMIT_NAMESPACE: &str = "sitegate";
pub const DEFAULT_CONTACT_INBOX: &str = "inbox@localhost.localdomain";

const DEV_SESSION_SECRET: &str = "dev-secret";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("SITEGATE_BIND is not a socket address: '{0}'")]
    InvalidBindAddr(String),

    #[error("SESSION_SECRET must be set (or SITEGATE_ALLOW_INSECURE_DEV=true)")]
    MissingSessionSecret,

    #[error("{0} must not be empty")]
    Empty(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,

    /// HS256 secret shared with the identity provider that mints sessions.
    pub session_secret: String,

    /// First segment of every rate-limit key this process derives.
    pub rate_limit_namespace: String,

    /// Where contact-form submissions are forwarded.
    pub contact_inbox: String,
}

impl ApiConfig {
    /// Defaults for everything except the session secret.
    pub fn new(session_secret: impl Into<String>) -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            session_secret: session_secret.into(),
            rate_limit_namespace: DEFAULT_RATE_LIMIT_NAMESPACE.to_string(),
            contact_inbox: DEFAULT_CONTACT_INBOX.to_string(),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key → value source.
    ///
    /// - `SITEGATE_BIND` (default `0.0.0.0:8080`)
    /// - `SESSION_SECRET` (required unless `SITEGATE_ALLOW_INSECURE_DEV=true`)
    /// - `RATE_LIMIT_NAMESPACE` (default `sitegate`)
    /// - `CONTACT_INBOX`
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind = lookup("SITEGATE_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind_addr: SocketAddr = bind
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr(bind.clone()))?;

        let insecure_dev = lookup("SITEGATE_ALLOW_INSECURE_DEV")
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"));

        let session_secret = match lookup("SESSION_SECRET").filter(|s| !s.trim().is_empty()) {
            Some(secret) => secret,
            None if insecure_dev => {
                tracing::warn!("SESSION_SECRET not set; using insecure dev default");
                DEV_SESSION_SECRET.to_string()
            }
            None => return Err(ConfigError::MissingSessionSecret),
        };

        let rate_limit_namespace = non_empty(
            lookup("RATE_LIMIT_NAMESPACE"),
            DEFAULT_RATE_LIMIT_NAMESPACE,
            "RATE_LIMIT_NAMESPACE",
        )?;
        let contact_inbox =
            non_empty(lookup("CONTACT_INBOX"), DEFAULT_CONTACT_INBOX, "CONTACT_INBOX")?;

        Ok(Self {
            bind_addr,
            session_secret,
            rate_limit_namespace,
            contact_inbox,
        })
    }
}

fn non_empty(
    value: Option<String>,
    default: &str,
    name: &'static str,
) -> Result<String, ConfigError> {
    match value {
        None => Ok(default.to_string()),
        Some(v) if v.trim().is_empty() => Err(ConfigError::Empty(name)),
        Some(v) => Ok(v.trim().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let cfg = ApiConfig::from_lookup(lookup(&[("SESSION_SECRET", "s3cret")])).unwrap();
        assert_eq!(cfg, ApiConfig::new("s3cret"));
    }

    #[test]
    fn missing_secret_is_an_error_outside_dev() {
        assert_eq!(
            ApiConfig::from_lookup(lookup(&[])),
            Err(ConfigError::MissingSessionSecret)
        );
        assert_eq!(
            ApiConfig::from_lookup(lookup(&[("SESSION_SECRET", "  ")])),
            Err(ConfigError::MissingSessionSecret)
        );
    }

    #[test]
    fn insecure_dev_falls_back_to_dev_secret() {
        let cfg =
            ApiConfig::from_lookup(lookup(&[("SITEGATE_ALLOW_INSECURE_DEV", "TRUE")])).unwrap();
        assert_eq!(cfg.session_secret, DEV_SESSION_SECRET);
    }

    #[test]
    fn overrides_and_invalid_values() {
        let cfg = ApiConfig::from_lookup(lookup(&[
            ("SESSION_SECRET", "x"),
            ("SITEGATE_BIND", "127.0.0.1:9000"),
            ("RATE_LIMIT_NAMESPACE", " shop "),
        ]))
        .unwrap();
        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(cfg.rate_limit_namespace, "shop");

        assert_eq!(
            ApiConfig::from_lookup(lookup(&[("SESSION_SECRET", "x"), ("SITEGATE_BIND", "nope")])),
            Err(ConfigError::InvalidBindAddr("nope".to_string()))
        );
        assert_eq!(
            ApiConfig::from_lookup(lookup(&[("SESSION_SECRET", "x"), ("CONTACT_INBOX", "")])),
            Err(ConfigError::Empty("CONTACT_INBOX"))
        );
    }
}
