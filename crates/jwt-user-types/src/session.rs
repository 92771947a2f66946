//! Session descriptor

use serde::{Deserialize, Serialize};

/// Result of a successful cookie verification.
///
/// The host uses it to switch the current identity and to decide how far
/// ahead an automatically renewed cookie should reach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescriptor<I> {
    /// Resolved identity
    pub identity: I,
    /// `exp - nbf` in seconds, 0 for a browser-session cookie
    pub duration: u64,
}

impl<I> SessionDescriptor<I> {
    pub fn new(identity: I, duration: u64) -> Self {
        Self { identity, duration }
    }

    /// Whether the session lives only as long as the browser session
    pub fn is_browser_session(&self) -> bool {
        self.duration == 0
    }
}
