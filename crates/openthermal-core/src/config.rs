//! Connection configuration.
//!
//! Endpoint, stream name, and bearer token resolve from explicit values
//! (CLI flags) first, then `OPENTHERMAL_*` environment variables, then
//! defaults targeting a local simulator. A missing token is not an error
//! here; the transport reports it as a connectivity failure on first use.

/// Default service endpoint: the local simulator.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8833";

/// Default stream name, after the sensor the reference producer publishes.
pub const DEFAULT_STREAM: &str = "amg8833";

pub const ENV_ENDPOINT: &str = "OPENTHERMAL_ENDPOINT";
pub const ENV_STREAM: &str = "OPENTHERMAL_STREAM";
pub const ENV_TOKEN: &str = "OPENTHERMAL_TOKEN";

/// Resolved connection settings for one stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    /// Base URL of the stream service, no trailing slash.
    pub endpoint: String,
    /// Stream name to tail.
    pub stream: String,
    /// Bearer credential. `None` means requests will fail with a
    /// connectivity error if the service requires auth.
    pub token: Option<String>,
}

impl StreamConfig {
    /// Resolve settings from explicit overrides, the process environment,
    /// and defaults, in that precedence order.
    pub fn resolve(
        endpoint: Option<String>,
        stream: Option<String>,
        token: Option<String>,
    ) -> Self {
        Self::resolve_with(endpoint, stream, token, |key| {
            std::env::var(key).ok()
        })
    }

    /// Same as [`resolve`](Self::resolve) with an injectable environment,
    /// so precedence is testable without touching process state.
    pub fn resolve_with(
        endpoint: Option<String>,
        stream: Option<String>,
        token: Option<String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let endpoint = endpoint
            .or_else(|| non_empty(env(ENV_ENDPOINT)))
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let stream = stream
            .or_else(|| non_empty(env(ENV_STREAM)))
            .unwrap_or_else(|| DEFAULT_STREAM.to_string());
        let token = token.or_else(|| non_empty(env(ENV_TOKEN)));
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            stream,
            token,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults_apply_when_nothing_is_set() {
        let config = StreamConfig::resolve_with(None, None, None, no_env);
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.stream, DEFAULT_STREAM);
        assert_eq!(config.token, None);
    }

    #[test]
    fn test_flags_beat_environment() {
        let env = |key: &str| match key {
            ENV_ENDPOINT => Some("http://env:1".to_string()),
            ENV_STREAM => Some("env-stream".to_string()),
            ENV_TOKEN => Some("env-token".to_string()),
            _ => None,
        };
        let config = StreamConfig::resolve_with(
            Some("http://flag:2".to_string()),
            Some("flag-stream".to_string()),
            None,
            env,
        );
        assert_eq!(config.endpoint, "http://flag:2");
        assert_eq!(config.stream, "flag-stream");
        // No flag for the token, so the environment wins there.
        assert_eq!(config.token.as_deref(), Some("env-token"));
    }

    #[test]
    fn test_empty_env_values_are_ignored() {
        let env = |key: &str| match key {
            ENV_TOKEN => Some(String::new()),
            _ => None,
        };
        let config = StreamConfig::resolve_with(None, None, None, env);
        assert_eq!(config.token, None);
    }

    #[test]
    fn test_trailing_slash_is_stripped() {
        let config = StreamConfig::resolve_with(
            Some("http://example.com/".to_string()),
            None,
            None,
            no_env,
        );
        assert_eq!(config.endpoint, "http://example.com");
    }
}
