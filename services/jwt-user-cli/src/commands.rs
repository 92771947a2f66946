//! Command handlers

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::DateTime;
use jwt_user_core::{
    decode, Clock, FixedClock, IdentityError, IdentityProvider, MemoryCookieStore,
    RequestContext, SessionConfig, SessionManager, StaticIdentity, SystemClock, Verification,
};
use jwt_user_types::TIME_CLAIMS;

use crate::cli::{Cli, Command, IdentityArgs, SessionArgs};

/// Provider that knows exactly one identity
struct SingleIdentity(StaticIdentity);

#[async_trait]
impl IdentityProvider for SingleIdentity {
    type Identity = StaticIdentity;

    async fn find_identity(&self, id: &str) -> Result<Option<StaticIdentity>, IdentityError> {
        Ok((self.0.id == id).then(|| self.0.clone()))
    }
}

pub async fn run(cli: Cli) -> Result<ExitCode> {
    let ctx = request_context(&cli.session);

    match cli.command {
        Command::Issue { identity, duration } => {
            let identity = StaticIdentity::from(identity);
            let manager = session_manager(&cli.session, identity.clone())?;
            let mut cookies = MemoryCookieStore::new();
            let token = manager.issue(&identity, duration, &ctx, &mut cookies)?;
            println!("{token}");
            Ok(ExitCode::SUCCESS)
        }

        Command::Inspect { token } => {
            inspect(&token)?;
            Ok(ExitCode::SUCCESS)
        }

        Command::Verify { token, identity } => {
            let manager = session_manager(&cli.session, identity.into())?;
            match manager.verify_token(&token, &ctx).await? {
                Verification::Verified { identity, claims } => {
                    println!("valid: identity {} ({}s session)", identity.id, claims.duration());
                    Ok(ExitCode::SUCCESS)
                }
                Verification::Rejected(reason) => {
                    println!("rejected [{}]: {}", reason.code(), reason);
                    Ok(ExitCode::FAILURE)
                }
            }
        }

        Command::Renew { token, identity } => {
            let manager = session_manager(&cli.session, identity.into())?;
            let mut cookies =
                MemoryCookieStore::with_value(manager.config().cookie.name.clone(), token);
            match manager.renew(&ctx, &mut cookies).await? {
                Some(renewed) => {
                    println!("{renewed}");
                    Ok(ExitCode::SUCCESS)
                }
                None => {
                    eprintln!("token not renewed");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}

fn session_manager(
    args: &SessionArgs,
    identity: StaticIdentity,
) -> Result<SessionManager<SingleIdentity>> {
    let config = session_config(args)?;
    tracing::debug!(?config, "Session configuration");

    let clock: Arc<dyn Clock> = match args.now {
        Some(now) => Arc::new(FixedClock::new(now)),
        None => Arc::new(SystemClock),
    };

    let manager = SessionManager::new(config, Arc::new(SingleIdentity(identity)))?;
    Ok(manager.with_clock(clock))
}

/// Environment configuration with command line overrides applied
fn session_config(args: &SessionArgs) -> Result<SessionConfig> {
    let signing_key = args.signing_key.clone();
    let mut config = SessionConfig::from_lookup(|name| match name {
        "JWT_USER_SIGNING_KEY" => signing_key.clone(),
        _ => std::env::var(name).ok(),
    })
    .context("signing key required: pass --signing-key or set JWT_USER_SIGNING_KEY")?;

    if let Some(binding) = args.binding {
        config = config.with_key_binding(binding.into());
    }
    if let Some(issuer) = &args.issuer {
        config = config.with_issuer(issuer.as_str());
    }
    if let Some(audience) = &args.audience {
        config = config.with_audience(audience.as_str());
    }
    Ok(config)
}

fn request_context(args: &SessionArgs) -> RequestContext {
    match &args.host {
        Some(host) => RequestContext::new().with_host_info(host.as_str()),
        None => RequestContext::new(),
    }
}

fn inspect(token: &str) -> Result<()> {
    let token = decode(token).context("failed to decode token")?;

    println!("Header:");
    println!("{}", serde_json::to_string_pretty(token.header())?);
    println!();
    println!("Claims:");
    println!("{}", serde_json::to_string_pretty(token.claims())?);

    let times: Vec<_> = TIME_CLAIMS
        .iter()
        .filter_map(|name| Some((name, token.claims().get(name)?.as_i64()?)))
        .collect();
    if !times.is_empty() {
        println!();
        for (name, timestamp) in times {
            println!("{name}: {}", format_timestamp(timestamp));
        }
    }
    Ok(())
}

/// Format timestamp as human-readable UTC string
fn format_timestamp(timestamp: i64) -> String {
    match DateTime::from_timestamp(timestamp, 0) {
        Some(datetime) => datetime.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => "Invalid timestamp".to_string(),
    }
}

impl From<IdentityArgs> for StaticIdentity {
    fn from(args: IdentityArgs) -> Self {
        StaticIdentity::new(args.id, args.auth_key)
    }
}
