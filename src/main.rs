//! Tokengate CLI - issue, verify and refresh signed access tokens
//!
//! Useful for operators and for scripting against services protected by tokengate.

mod config;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tokengate_core::{ClaimSet, ClaimValue, JwtConfig, TokenEngine, TokenType, RESERVED_CLAIMS};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Tokengate - stateless access/refresh tokens
#[derive(Parser, Debug)]
#[command(name = "tokengate")]
#[command(about = "Issue, verify and refresh signed access/refresh tokens")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// YAML configuration file
    #[arg(long, global = true, env = "TOKENGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Signing secret (at least 32 bytes), overrides the config file
    #[arg(long, global = true, env = "TOKENGATE_SECRET", hide_env_values = true)]
    secret: Option<String>,

    /// Access token lifetime in seconds
    #[arg(long, global = true, env = "TOKENGATE_ACCESS_TOKEN_EXPIRATION")]
    access_token_expiration: Option<u64>,

    /// Refresh token lifetime in seconds
    #[arg(long, global = true, env = "TOKENGATE_REFRESH_TOKEN_EXPIRATION")]
    refresh_token_expiration: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Issue a token for a subject
    #[command(long_about = r#"
Issue a signed token for a subject and print it to stdout.

EXAMPLES:
  # Access token with two extra claims
  tokengate issue --subject alice --claim role=admin --claim tenant=42

  # Access and refresh token together, as JSON
  tokengate issue --subject alice --pair

ENVIRONMENT VARIABLES:
  TOKENGATE_SECRET                    Signing secret
  TOKENGATE_CONFIG                    Config file path
  TOKENGATE_ACCESS_TOKEN_EXPIRATION   Access token lifetime (seconds)
  TOKENGATE_REFRESH_TOKEN_EXPIRATION  Refresh token lifetime (seconds)
    "#)]
    Issue {
        /// Subject (usually a username)
        #[arg(long)]
        subject: String,

        /// Token type: access or refresh
        #[arg(long = "type", default_value = "access")]
        token_type: TokenType,

        /// Extra claim as name=value (repeatable)
        #[arg(long = "claim", value_parser = parse_claim)]
        claims: Vec<(String, ClaimValue)>,

        /// Issue an access and a refresh token together
        #[arg(long, conflicts_with = "token_type")]
        pair: bool,
    },

    /// Verify a token and print its claims as JSON
    Verify {
        token: String,

        /// Fail unless the token is of this type
        #[arg(long)]
        expect: Option<TokenType>,
    },

    /// Exchange a refresh token for a new access token
    Refresh { token: String },
}

/// Setup logging with the specified log level
fn setup_logging(verbose: bool) {
    let log_level = if verbose { "debug" } else { "info" };

    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

/// Parse `name=value`, typing the value as bool, integer, float or string
fn parse_claim(raw: &str) -> std::result::Result<(String, ClaimValue), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{}'", raw))?;

    if name.is_empty() {
        return Err("claim name cannot be empty".to_string());
    }
    if RESERVED_CLAIMS.contains(&name) {
        return Err(format!("claim '{}' is reserved", name));
    }

    let value = if let Ok(b) = value.parse::<bool>() {
        ClaimValue::Bool(b)
    } else if let Ok(i) = value.parse::<i64>() {
        ClaimValue::Integer(i)
    } else if let Some(x) = value.parse::<f64>().ok().filter(|x| x.is_finite()) {
        ClaimValue::Float(x)
    } else {
        ClaimValue::String(value.to_string())
    };

    Ok((name.to_string(), value))
}

fn build_engine(cli: &Cli) -> Result<TokenEngine> {
    let overrides = config::Overrides {
        secret: cli.secret.clone(),
        access_token_expiration: cli.access_token_expiration,
        refresh_token_expiration: cli.refresh_token_expiration,
    };
    let config: JwtConfig = config::load(cli.config.as_deref(), &overrides)?;
    debug!("Loaded configuration: {:?}", config);

    if !config.enabled {
        bail!("Token authentication is disabled in the configuration");
    }

    TokenEngine::new(&config).context("Invalid token configuration")
}

fn run(cli: Cli) -> Result<()> {
    let engine = build_engine(&cli)?;

    match cli.command {
        Commands::Issue {
            subject,
            token_type,
            claims,
            pair,
        } => {
            let claims: ClaimSet = claims.into_iter().collect();

            if pair {
                let pair = engine
                    .issue_pair(&subject, &claims)
                    .context("Failed to issue tokens")?;
                let output = json!({
                    "access_token": pair.access_token.as_str(),
                    "refresh_token": pair.refresh_token.as_str(),
                    "expires_in": engine.lifetime(TokenType::Access).num_seconds(),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                let token = engine
                    .issue(&subject, &claims, token_type)
                    .context("Failed to issue token")?;
                println!("{}", token);
            }
        }
        Commands::Verify { token, expect } => {
            let verified = engine.verify(token.trim()).context("Token rejected")?;
            if let Some(expected) = expect {
                verified.require_type(expected).context("Token rejected")?;
            }

            let output = json!({
                "subject": verified.subject(),
                "type": verified.token_type(),
                "issued_at": verified.issued_at().to_rfc3339(),
                "expires_at": verified.expires_at().to_rfc3339(),
                "claims": verified.claims(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Refresh { token } => {
            let access = engine
                .refresh_access_token(token.trim())
                .context("Refresh failed")?;
            println!("{}", access);
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);
    run(cli)
}
