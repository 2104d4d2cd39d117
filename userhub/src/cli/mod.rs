//! CLI module for userhub
//!
//! Provides the command-line interface for running the server and applying migrations.

pub mod migrate;
pub mod serve;

use clap::{Parser, Subcommand};

/// userhub - User management server with transactional audit logging
#[derive(Parser, Debug)]
#[command(name = "userhub")]
#[command(version, about, long_about = None)]
#[command(after_help = r#"ENVIRONMENT VARIABLES:
    USERHUB_HOST            Bind address (default: 0.0.0.0)
    USERHUB_PORT            Listen port (default: 3000)
    USERHUB_DATABASE_URL    Database URL (default: sqlite:data/userhub.db)
    USERHUB_ENV             Runtime environment (development, test, production)
    USERHUB_LOG_LEVEL       Log level (default: info)
    USERHUB_LOG_DIR         Directory for daily-rotated log files
"#)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve(serve::ServeArgs),
    /// Apply database migrations and exit
    Migrate(migrate::MigrateArgs),
}
