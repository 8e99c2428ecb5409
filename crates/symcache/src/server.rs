//! Symbol server address: split once into origin and path prefix.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{SymbolCacheError, SymbolCacheResult};

/// Origin part (optional scheme) followed by a slash-led path. Whitespace is
/// never part of a host.
static SERVER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((?:(?:http|https)://)?[^/\s]+)(/.*)$").unwrap()
});

/// Parsed server URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddress {
    host_and_scheme: String,
    path_prefix: String,
}

impl ServerAddress {
    /// Parse a server URL. A trailing `/` is appended when missing, so the
    /// path prefix always starts and ends with `/`.
    pub fn parse(server_url: &str) -> SymbolCacheResult<Self> {
        let trimmed = server_url.trim();
        if trimmed.is_empty() {
            return Err(SymbolCacheError::ConfigInvalid {
                message: "server URL is empty".to_string(),
            });
        }

        let mut normalized = trimmed.to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }

        let caps = SERVER_RE
            .captures(&normalized)
            .ok_or_else(|| SymbolCacheError::ConfigInvalid {
                message: format!("cannot split server URL into host and path: {}", server_url),
            })?;

        Ok(Self {
            host_and_scheme: caps[1].to_string(),
            path_prefix: caps[2].to_string(),
        })
    }

    /// Scheme and host as configured (e.g. `https://msdl.microsoft.com`).
    pub fn host_and_scheme(&self) -> &str {
        &self.host_and_scheme
    }

    /// Path prefix, always starting and ending with `/`.
    pub fn path_prefix(&self) -> &str {
        &self.path_prefix
    }

    /// Absolute URL for a relative symbol path. A bare host defaults to http.
    pub fn url_for(&self, relative_path: &str) -> String {
        let origin = if self.host_and_scheme.contains("://") {
            self.host_and_scheme.clone()
        } else {
            format!("http://{}", self.host_and_scheme)
        };
        format!("{}{}{}", origin, self.path_prefix, relative_path)
    }
}
