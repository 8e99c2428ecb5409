//! HTTP layer: GET against the symbol server plus the size check.
//!
//! This is the only place that looks at status codes and headers.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_LENGTH, USER_AGENT};
use reqwest::StatusCode;
use tracing::debug;

use crate::error::{SymbolCacheError, SymbolCacheResult};
use crate::server::ServerAddress;
use crate::types::SymbolCacheConfig;

const USER_AGENT_VALUE: &str = concat!("symcache/", env!("CARGO_PKG_VERSION"));

/// Cap on the up-front buffer reservation taken from `Content-Length`.
const PREALLOCATE_LIMIT: u64 = 64 * 1024 * 1024;

/// HTTP backend bound to one symbol server.
#[derive(Debug, Clone)]
pub(crate) struct HttpFetcher {
    client: reqwest::Client,
    server: ServerAddress,
}

impl HttpFetcher {
    pub(crate) fn new(
        server: ServerAddress,
        config: &SymbolCacheConfig,
    ) -> SymbolCacheResult<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let mut builder = reqwest::Client::builder()
            .default_headers(default_headers)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects));
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let client = builder.build().map_err(|e| SymbolCacheError::ConfigInvalid {
            message: format!("failed to create HTTP client: {}", e),
        })?;

        Ok(Self { client, server })
    }

    pub(crate) fn server(&self) -> &ServerAddress {
        &self.server
    }

    /// Fetch the full body of a symbol file. The body is only returned when
    /// the status is 200 and `Content-Length` matches the received bytes.
    pub(crate) async fn fetch(&self, relative_path: &str) -> SymbolCacheResult<Vec<u8>> {
        let url = self.server.url_for(relative_path);
        debug!(url = %url, "requesting symbol file");

        let transport = |message: String| SymbolCacheError::Transport {
            path: relative_path.to_string(),
            message,
        };

        let mut response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport(format!("request failed: {}", e)))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(transport(format!("HTTP {}", status.as_u16())));
        }

        let declared = declared_length(response.headers().get(CONTENT_LENGTH));
        let capacity = declared.unwrap_or(0).min(PREALLOCATE_LIMIT) as usize;
        let mut body = Vec::with_capacity(capacity);
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => body.extend_from_slice(&chunk),
                Ok(None) => break,
                // A connection closed before the declared length is a short body.
                Err(_) if declared.is_some_and(|len| (body.len() as u64) < len) => {
                    return Err(SymbolCacheError::SizeMismatch {
                        path: relative_path.to_string(),
                        declared,
                        actual: body.len() as u64,
                    });
                }
                Err(e) => {
                    return Err(transport(format!("failed to read response body: {}", e)));
                }
            }
        }

        check_length(relative_path, declared, body.len())?;
        Ok(body)
    }
}

fn declared_length(header: Option<&HeaderValue>) -> Option<u64> {
    header
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Reject missing, zero, or wrong `Content-Length`.
pub(crate) fn check_length(
    relative_path: &str,
    declared: Option<u64>,
    actual: usize,
) -> SymbolCacheResult<()> {
    match declared {
        Some(len) if len != 0 && len == actual as u64 => Ok(()),
        _ => Err(SymbolCacheError::SizeMismatch {
            path: relative_path.to_string(),
            declared,
            actual: actual as u64,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_length_accepts_exact() {
        assert!(check_length("a.pdb/X1/a.pdb", Some(4096), 4096).is_ok());
    }

    #[test]
    fn test_check_length_rejects_missing_zero_and_mismatch() {
        for (declared, actual) in [(None, 10), (Some(0), 0), (Some(100), 99), (Some(5), 6)] {
            let err = check_length("a.pdb/X1/a.pdb", declared, actual).unwrap_err();
            assert!(
                matches!(err, SymbolCacheError::SizeMismatch { .. }),
                "declared {:?} actual {} should mismatch",
                declared,
                actual
            );
        }
    }

    #[test]
    fn test_declared_length_parsing() {
        assert_eq!(
            declared_length(Some(&HeaderValue::from_static("1234"))),
            Some(1234)
        );
        assert_eq!(declared_length(Some(&HeaderValue::from_static("abc"))), None);
        assert_eq!(declared_length(None), None);
    }
}
