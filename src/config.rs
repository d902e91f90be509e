use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::db::Database;
use crate::models::Role;
use crate::policy::{ClosedStagePolicy, DEFAULT_CLOSED_STAGES, DEFAULT_EXCLUDED_STAGES};

#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Small business CRM: contacts, deals and a sales pipeline over a REST API")]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub serve: ServeArgs,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server (the default)
    Serve(ServeArgs),
    /// Create the schema and seed the default pipeline stages
    Migrate {
        #[command(flatten)]
        db: DbArgs,
    },
    /// Add a login account
    CreateUser(CreateUserArgs),
}

#[derive(Args, Clone, Debug, Default)]
pub struct DbArgs {
    /// SQLite database file (defaults to the platform data directory)
    #[arg(long = "db", env = "TALLY_DB")]
    pub path: Option<PathBuf>,
}

impl DbArgs {
    pub fn open(&self) -> anyhow::Result<Database> {
        match &self.path {
            Some(path) => Database::open(path),
            None => Database::open_default(),
        }
    }
}

#[derive(Args, Clone, Debug)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, env = "TALLY_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port for HTTP API
    #[arg(short, long, env = "TALLY_PORT", default_value_t = 3000)]
    pub port: u16,

    #[command(flatten)]
    pub db: DbArgs,

    /// HMAC secret used to sign session tokens
    #[arg(long, env = "TALLY_JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Session token lifetime
    #[arg(long, env = "TALLY_TOKEN_TTL_HOURS", default_value_t = 168)]
    pub token_ttl_hours: i64,

    /// Stages that mark a deal as closed
    #[arg(
        long,
        env = "TALLY_CLOSED_STAGES",
        value_delimiter = ',',
        default_values_t = DEFAULT_CLOSED_STAGES.iter().map(|s| s.to_string())
    )]
    pub closed_stages: Vec<String>,

    /// Stages left out of the dashboard's open pipeline value
    #[arg(
        long,
        env = "TALLY_EXCLUDED_STAGES",
        value_delimiter = ',',
        default_values_t = DEFAULT_EXCLUDED_STAGES.iter().map(|s| s.to_string())
    )]
    pub excluded_stages: Vec<String>,
}

#[derive(Args, Clone, Debug)]
pub struct CreateUserArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub email: String,

    #[arg(long, env = "TALLY_NEW_USER_PASSWORD", hide_env_values = true)]
    pub password: String,

    #[arg(long, value_enum, default_value_t = RoleArg::Admin)]
    pub role: RoleArg,

    #[command(flatten)]
    pub db: DbArgs,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    Admin,
    Member,
}

impl From<RoleArg> for Role {
    fn from(value: RoleArg) -> Self {
        match value {
            RoleArg::Admin => Role::Admin,
            RoleArg::Member => Role::Member,
        }
    }
}

/// Resolved settings for the `serve` command.
#[derive(Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub db: DbArgs,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    pub policy: ClosedStagePolicy,
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("addr", &self.addr)
            .field("db", &self.db)
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("policy", &self.policy)
            .finish()
    }
}

impl ServeArgs {
    pub fn into_config(self) -> anyhow::Result<ServerConfig> {
        let addr: SocketAddr = format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))?;
        let jwt_secret = self
            .jwt_secret
            .filter(|s| !s.trim().is_empty())
            .context("TALLY_JWT_SECRET must be provided")?;
        if self.token_ttl_hours <= 0 {
            anyhow::bail!("token lifetime must be positive");
        }

        Ok(ServerConfig {
            addr,
            db: self.db,
            jwt_secret,
            token_ttl: chrono::Duration::hours(self.token_ttl_hours),
            policy: ClosedStagePolicy::new(&self.closed_stages, &self.excluded_stages),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_build_a_config() {
        let cli = Cli::parse_from(["tally", "--jwt-secret", "s3cret"]);
        assert!(cli.command.is_none());

        let config = cli.serve.into_config().unwrap();
        assert_eq!(config.addr.port(), 3000);
        assert_eq!(config.token_ttl, chrono::Duration::hours(168));
        assert!(config.policy.is_closed("onboarding"));
        assert!(config.policy.is_excluded_from_totals("archive"));
    }

    #[test]
    fn closed_stages_are_comma_separated() {
        let cli = Cli::parse_from([
            "tally",
            "serve",
            "--jwt-secret",
            "s3cret",
            "--closed-stages",
            "won,live",
        ]);
        let Some(Commands::Serve(args)) = cli.command else {
            panic!("expected serve");
        };
        let config = args.into_config().unwrap();
        assert!(config.policy.is_closed("won"));
        assert!(config.policy.is_closed("live"));
        assert!(!config.policy.is_closed("active"));
    }

    #[test]
    fn missing_secret_is_an_error() {
        let cli = Cli::parse_from(["tally", "--port", "8080"]);
        assert!(cli.serve.into_config().is_err());
    }

    #[test]
    fn create_user_defaults_to_admin() {
        let cli = Cli::parse_from([
            "tally",
            "create-user",
            "--name",
            "Owner",
            "--email",
            "owner@example.com",
            "--password",
            "pw",
        ]);
        let Some(Commands::CreateUser(args)) = cli.command else {
            panic!("expected create-user");
        };
        assert_eq!(Role::from(args.role), Role::Admin);
    }

    #[test]
    fn db_args_open_a_file_backed_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tally.db");
        let args = DbArgs {
            path: Some(path.clone()),
        };

        let db = args.open().unwrap();
        db.migrate().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn debug_output_hides_the_jwt_secret() {
        let cli = Cli::parse_from(["tally", "--jwt-secret", "hunter2-signing-key"]);
        let config = cli.serve.into_config().unwrap();

        let printed = format!("{:?}", config);
        assert!(!printed.contains("hunter2-signing-key"));
        assert!(printed.contains("<redacted>"));
        assert_eq!(config.jwt_secret, "hunter2-signing-key");
    }
}
