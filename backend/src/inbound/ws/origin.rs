//! Runtime Origin allow-list for WebSocket upgrades.
//!
//! Entries come from configuration and take one of three forms:
//!
//! ```text
//! https://roadguard.app        exact origin (scheme, host and port)
//! https://*.roadguard.app      any subdomain over the given scheme
//! http://localhost:*           any explicit, non-zero port on the host
//! ```

use thiserror::Error;
use url::{Origin, Url};

#[derive(Debug, Clone, PartialEq, Eq)]
enum OriginRule {
    Exact(Origin),
    Subdomains { scheme: String, suffix: String },
    AnyPort { scheme: String, host: String },
}

impl OriginRule {
    fn matches(&self, origin: &Url) -> bool {
        let Some(host) = origin.host_str() else {
            return false;
        };
        match self {
            Self::Exact(expected) => origin.origin() == *expected,
            Self::Subdomains { scheme, suffix } => {
                origin.scheme() == scheme
                    && host
                        .strip_suffix(suffix.as_str())
                        .is_some_and(|label| !label.is_empty())
            }
            Self::AnyPort {
                scheme,
                host: expected,
            } => {
                origin.scheme() == scheme
                    && host == expected
                    && matches!(origin.port(), Some(port) if port != 0)
            }
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OriginRuleError {
    #[error("allowed origin `{entry}` is not a valid URL: {message}")]
    Unparsable { entry: String, message: String },
    #[error("allowed origin `{entry}` has no host")]
    MissingHost { entry: String },
}

fn parse_rule(entry: &str) -> Result<OriginRule, OriginRuleError> {
    let trimmed = entry.trim().trim_end_matches('/');
    if let Some((scheme, rest)) = trimmed.split_once("://") {
        if let Some(domain) = rest.strip_prefix("*.") {
            return Ok(OriginRule::Subdomains {
                scheme: scheme.to_ascii_lowercase(),
                suffix: format!(".{}", domain.to_ascii_lowercase()),
            });
        }
        if let Some(host) = rest.strip_suffix(":*") {
            if host.is_empty() {
                return Err(OriginRuleError::MissingHost {
                    entry: entry.to_owned(),
                });
            }
            return Ok(OriginRule::AnyPort {
                scheme: scheme.to_ascii_lowercase(),
                host: host.to_ascii_lowercase(),
            });
        }
    }

    let url = Url::parse(trimmed).map_err(|err| OriginRuleError::Unparsable {
        entry: entry.to_owned(),
        message: err.to_string(),
    })?;
    if url.host_str().is_none() {
        return Err(OriginRuleError::MissingHost {
            entry: entry.to_owned(),
        });
    }
    Ok(OriginRule::Exact(url.origin()))
}

/// Parsed set of origins allowed to open a WebSocket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedOrigins {
    rules: Vec<OriginRule>,
}

impl AllowedOrigins {
    /// Parse configuration entries; the first bad entry aborts.
    pub fn parse<I, S>(entries: I) -> Result<Self, OriginRuleError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules = entries
            .into_iter()
            .map(|entry| parse_rule(entry.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// Local development front-ends on any port.
    pub fn localhost() -> Self {
        Self {
            rules: vec![OriginRule::AnyPort {
                scheme: "http".to_owned(),
                host: "localhost".to_owned(),
            }],
        }
    }

    pub fn allows(&self, origin: &Url) -> bool {
        self.rules.iter().any(|rule| rule.matches(origin))
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for AllowedOrigins {
    fn default() -> Self {
        Self::localhost()
    }
}
