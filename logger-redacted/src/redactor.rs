#![allow(clippy::expect_used)]

use base64::{engine::general_purpose, Engine as _};
use lazy_static::lazy_static;
use regex::Regex;
use sha2::{Digest, Sha256};

lazy_static! {
    static ref BEARER_REGEX: Regex =
        Regex::new(r"(?i)\bBearer\s+[A-Za-z0-9._~+/=-]+").expect("bearer pattern");
    static ref JWT_REGEX: Regex =
        Regex::new(r"\beyJ[A-Za-z0-9_-]*\.[A-Za-z0-9_-]+\.[A-Za-z0-9_-]*").expect("jwt pattern");
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("email pattern");
    static ref IP_REGEX: Regex =
        Regex::new(r"\b(?:[0-9]{1,3}\.){3}[0-9]{1,3}\b").expect("ipv4 pattern");
}

/// Redaction configuration
#[derive(Debug, Clone)]
pub struct RedactionConfig {
    pub redact_tokens: bool,
    pub redact_emails: bool,
    pub redact_ip_addresses: bool,
    pub hash_for_correlation: bool,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            redact_tokens: true,
            redact_emails: true,
            redact_ip_addresses: true,
            hash_for_correlation: true,
        }
    }
}

/// Scrubs bearer tokens and personal data out of log lines.
///
/// Tokens are always replaced by `TOKEN[<fingerprint>]` so that two log lines
/// about the same token can be correlated without the token being readable.
#[derive(Debug, Clone, Default)]
pub struct PiiRedactor {
    config: RedactionConfig,
}

impl PiiRedactor {
    pub fn new(config: RedactionConfig) -> Self {
        Self { config }
    }

    pub fn redact(&self, text: &str) -> String {
        let mut result = text.to_string();

        if self.config.redact_tokens {
            result = Self::redact_tokens(&result);
        }

        if self.config.redact_emails {
            result = self.redact_emails(&result);
        }

        if self.config.redact_ip_addresses {
            result = self.redact_ip_addresses(&result);
        }

        result
    }

    fn redact_tokens(text: &str) -> String {
        let text = BEARER_REGEX.replace_all(text, |caps: &regex::Captures| {
            let matched = caps.get(0).map_or("", |m| m.as_str());
            let token = matched.split_whitespace().last().unwrap_or_default();
            format!("Bearer TOKEN[{}]", token_fingerprint(token))
        });
        JWT_REGEX
            .replace_all(&text, |caps: &regex::Captures| {
                let token = caps.get(0).map_or("", |m| m.as_str());
                format!("TOKEN[{}]", token_fingerprint(token))
            })
            .to_string()
    }

    fn redact_emails(&self, text: &str) -> String {
        EMAIL_REGEX
            .replace_all(text, |caps: &regex::Captures| {
                let email = caps.get(0).map_or("", |m| m.as_str());
                if self.config.hash_for_correlation {
                    format!("EMAIL[{}]", hash_value(email))
                } else {
                    match email.split_once('@') {
                        Some((local, domain)) => format!(
                            "{}***@{}***",
                            local.chars().next().unwrap_or('*'),
                            domain.chars().next().unwrap_or('*')
                        ),
                        None => "***@***".to_string(),
                    }
                }
            })
            .to_string()
    }

    fn redact_ip_addresses(&self, text: &str) -> String {
        IP_REGEX
            .replace_all(text, |caps: &regex::Captures| {
                let ip = caps.get(0).map_or("", |m| m.as_str());
                if self.config.hash_for_correlation {
                    format!("IP[{}]", hash_value(ip))
                } else {
                    let parts: Vec<&str> = ip.split('.').collect();
                    match (parts.first(), parts.get(3)) {
                        (Some(first), Some(last)) => format!("{first}.***.***.{last}"),
                        _ => "***.***.***.***".to_string(),
                    }
                }
            })
            .to_string()
    }
}

/// Short, stable, non-reversible identifier for a token.
pub fn token_fingerprint(token: &str) -> String {
    hash_value(token)
}

fn hash_value(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    // first 8 bytes
    general_purpose::STANDARD.encode(digest.get(..8).unwrap_or_default())
}
