//! Configuration for sync runs.

use std::time::Duration;

/// Default User-Agent header sent with every remote request.
///
/// Public data hosts expect a self-identifying client; an anonymous agent
/// string is the quickest way to get a mirror blocked.
pub const DEFAULT_USER_AGENT: &str = concat!(
    "datamirror/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/datamirror/datamirror)"
);

/// Configuration shared by the sync engine and its HTTP collaborators.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Worker threads used for per-file signature probes, uploads, and
    /// deletions.
    pub concurrency: usize,
    /// Timeout applied to every remote request.
    pub timeout: Duration,
    /// User-Agent header sent with every remote request.
    pub user_agent: String,
}

impl SyncConfig {
    /// Creates a configuration with the default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            concurrency: 4,
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Sets the number of worker threads.
    ///
    /// A value of zero is treated as one worker.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Sets the remote request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the User-Agent header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_config_defaults() {
        let config = SyncConfig::new();
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn sync_config_builder() {
        let config = SyncConfig::new()
            .with_concurrency(8)
            .with_timeout(Duration::from_secs(5))
            .with_user_agent("mirror-bot/2.0 (ops@example.com)");

        assert_eq!(config.concurrency, 8);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.user_agent, "mirror-bot/2.0 (ops@example.com)");
    }
}
