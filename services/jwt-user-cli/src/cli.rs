//! Command line definition

use clap::{Args, Parser, Subcommand, ValueEnum};
use jwt_user_core::KeyBinding;

#[derive(Parser, Debug)]
#[command(name = "jwt-user", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub session: SessionArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Overrides on top of the `JWT_USER_*` environment
#[derive(Args, Debug)]
pub struct SessionArgs {
    /// Base HMAC secret
    #[arg(long, env = "JWT_USER_SIGNING_KEY", hide_env_values = true, global = true)]
    pub signing_key: Option<String>,

    /// How tokens are bound to the identity's auth key
    #[arg(long, value_enum, global = true)]
    pub binding: Option<BindingArg>,

    /// Fixed issuer to issue and enforce
    #[arg(long, global = true)]
    pub issuer: Option<String>,

    /// Fixed audience to issue and enforce
    #[arg(long, global = true)]
    pub audience: Option<String>,

    /// Request origin, used for iss/aud when they are not fixed
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Evaluate as of this Unix timestamp instead of now
    #[arg(long, global = true)]
    pub now: Option<i64>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Mint a token for an identity
    Issue {
        #[command(flatten)]
        identity: IdentityArgs,

        /// Lifetime in seconds; 0 issues a browser-session token without exp
        #[arg(long, default_value = "3600")]
        duration: u64,
    },

    /// Decode a token without checking it
    Inspect {
        token: String,
    },

    /// Check signature, claims and auth key of a token
    Verify {
        token: String,

        #[command(flatten)]
        identity: IdentityArgs,
    },

    /// Slide a token's validity window to start now
    Renew {
        token: String,

        #[command(flatten)]
        identity: IdentityArgs,
    },
}

/// The one identity the command resolves against
#[derive(Args, Debug)]
pub struct IdentityArgs {
    /// Identity id, stored in jti
    #[arg(long)]
    pub id: String,

    /// Identity's current auth key
    #[arg(long, default_value = "")]
    pub auth_key: String,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindingArg {
    /// Base secret only
    None,
    /// authKey claim checked against the identity
    Claim,
    /// Auth key appended to the signing secret
    Append,
}

impl From<BindingArg> for KeyBinding {
    fn from(arg: BindingArg) -> Self {
        match arg {
            BindingArg::None => KeyBinding::None,
            BindingArg::Claim => KeyBinding::Claim,
            BindingArg::Append => KeyBinding::AppendToKey,
        }
    }
}
