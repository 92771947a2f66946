//! jwt-user CLI
//!
//! Local tooling around identity cookie tokens: mint one for an identity,
//! decode one, or run it through verification and renewal exactly as a
//! web host would.

mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    jwt_user_utils::load_env();
    jwt_user_utils::init_tracing();

    let cli = cli::Cli::parse();
    commands::run(cli).await
}
