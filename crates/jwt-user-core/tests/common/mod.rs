//! Common test utilities for jwt-user-core integration tests

pub mod mock_identities;

#[allow(unused_imports)]
pub use mock_identities::{context, manager, MockIdentityProvider, SIGNING_KEY, T0};
