// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Helicon CLI
//!
//! Demonstration of the helicon library. Credentials come from the
//! `HELICON_*` environment variables.

use std::env;
use std::process::ExitCode;

use anyhow::Context;
use helicon::{Config, Helicon, SessionCredentials};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("helicon=info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return ExitCode::from(1);
    }

    let result = match args[1].as_str() {
        "login" => login().await,
        "tweet" => {
            if args.len() < 3 {
                eprintln!("Usage: helicon tweet <id>");
                return ExitCode::from(1);
            }
            tweet(&args[2]).await
        }
        "refresh-bearer" => refresh_bearer().await,
        "--help" | "-h" | "help" => {
            print_usage();
            return ExitCode::SUCCESS;
        }
        "--version" | "-v" | "version" => {
            println!("helicon {}", helicon::VERSION);
            return ExitCode::SUCCESS;
        }
        cmd => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            return ExitCode::from(1);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn print_usage() {
    println!(
        r#"Helicon - Unofficial X client

USAGE:
    helicon <COMMAND>

COMMANDS:
    login           Authenticate and show session cookie expiry
    tweet <id>      Fetch TweetDetail JSON for a tweet
    refresh-bearer  Re-scrape the anonymous bearer for the stored session
    help            Show this help message
    version         Show version information

ENVIRONMENT:
    HELICON_USERNAME     Account username (required)
    HELICON_PASSWORD     Account password (required)
    HELICON_FORCE_LOGIN  Ignore the stored session (true/false)
    HELICON_USER_AGENT   Override the browser user agent
    RUST_LOG             Log filter, default helicon=info
"#
    );
}

async fn authenticated() -> anyhow::Result<(Helicon, SessionCredentials)> {
    let config = Config::from_env().context("failed to read configuration")?;
    let helicon = Helicon::new(config).context("failed to create client")?;
    let session = helicon
        .authenticate()
        .await
        .context("failed to authenticate")?;
    Ok((helicon, session))
}

async fn login() -> anyhow::Result<()> {
    let (_, session) = authenticated().await?;

    println!("=== Session ===");
    for cookie in [&session.csrf_token, &session.auth_token] {
        match cookie.expires {
            Some(expires) => println!("{} expires {}", cookie.key, expires.to_rfc3339()),
            None => println!("{} has no expiry", cookie.key),
        }
    }
    Ok(())
}

async fn tweet(id: &str) -> anyhow::Result<()> {
    let (helicon, _) = authenticated().await?;

    let detail = match helicon.tweet_detail(id).await {
        Err(e) if e.is_unauthorized() => {
            eprintln!("API answered 401, refreshing anonymous bearer");
            helicon
                .refresh_anonymous_bearer()
                .await
                .context("failed to refresh anonymous bearer")?;
            helicon.tweet_detail(id).await?
        }
        other => other.with_context(|| format!("failed to fetch tweet {}", id))?,
    };

    println!("{}", serde_json::to_string_pretty(&detail)?);
    Ok(())
}

async fn refresh_bearer() -> anyhow::Result<()> {
    let (helicon, before) = authenticated().await?;
    let bearer = helicon.refresh_anonymous_bearer().await?;

    if bearer == before.bearer_token {
        println!("Anonymous bearer unchanged ({} chars)", bearer.len());
    } else {
        println!("Anonymous bearer updated ({} chars)", bearer.len());
    }
    Ok(())
}
