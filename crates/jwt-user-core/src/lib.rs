//! JWT User Core - Stateless cookie sessions
//!
//! Issues, verifies and renews signed session tokens carried in a cookie,
//! replacing server-side session storage. The hosting framework supplies a
//! [`CookieStore`] and an [`IdentityProvider`]; everything else lives here.

pub mod clock;
pub mod config;
pub mod cookie;
pub mod crypto;
pub mod error;
pub mod identity;
pub mod key;
pub mod session;
pub mod token;
pub mod validation;

pub use clock::*;
pub use config::*;
pub use cookie::*;
pub use crypto::*;
pub use error::*;
pub use identity::*;
pub use key::*;
pub use session::*;
pub use token::{decode, encode, Header, Token, ALGORITHM};
pub use validation::*;

pub use jwt_user_types::{ClaimSet, RequestContext, SessionDescriptor};
