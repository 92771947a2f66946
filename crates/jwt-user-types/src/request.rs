//! Per-request context supplied by the host

use serde::{Deserialize, Serialize};

/// Facts about the current request that the session core needs.
///
/// The core never talks to the hosting framework directly. The host fills
/// this in once per request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Scheme and authority of the current request, e.g. `https://example.com`.
    /// Used as the default issuer and audience.
    pub host_info: Option<String>,
    /// Network origin of the caller, for audit logs
    pub user_ip: Option<String>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_host_info(mut self, host_info: impl Into<String>) -> Self {
        self.host_info = Some(host_info.into());
        self
    }

    #[must_use]
    pub fn with_user_ip(mut self, user_ip: impl Into<String>) -> Self {
        self.user_ip = Some(user_ip.into());
        self
    }

    /// Caller address for log lines
    pub fn client_ip(&self) -> &str {
        self.user_ip.as_deref().unwrap_or("unknown")
    }
}
