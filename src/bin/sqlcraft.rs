//! sqlcraft: schema tooling CLI
//!
//! # Usage
//!
//! ```bash
//! # Print a live table definition as JSON
//! sqlcraft --database-url postgres://localhost/app reflect users
//!
//! # Print the DDL that would create a table (no connection needed)
//! sqlcraft --dialect mysql ddl schema/users.json
//!
//! # Create or migrate the table in place
//! sqlcraft apply schema/users.json
//! ```

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::*;
use sqlcraft::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sqlcraft")]
#[command(version)]
#[command(about = "Reflect, generate and apply table schemas", long_about = None)]
#[command(after_help = "EXAMPLES:
    sqlcraft reflect users
    sqlcraft --dialect mysql --prefix wp_ ddl posts.json
    sqlcraft apply posts.json")]
struct Cli {
    /// Database connection URL
    #[arg(long, env = "SQLCRAFT_DATABASE_URL", global = true)]
    database_url: Option<String>,

    /// Config file (defaults to <config dir>/sqlcraft/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Table name prefix
    #[arg(short, long, global = true)]
    prefix: Option<String>,

    /// Target dialect (postgres, mysql)
    #[arg(short, long, global = true)]
    dialect: Option<Dialect>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the live definition of a table as JSON
    Reflect {
        /// Logical table name (without prefix)
        table: String,
    },
    /// Print the statements that create a table from a JSON definition
    Ddl {
        /// Path to the table definition
        schema: PathBuf,
    },
    /// Create or alter a table to match a JSON definition
    Apply {
        /// Path to the table definition
        schema: PathBuf,
    },
}

/// Config file values with command-line flags layered on top.
struct Settings {
    database_url: Option<String>,
    dialect: Dialect,
    prefix: String,
}

impl Settings {
    fn resolve(cli: &Cli) -> Result<Self> {
        let mut config = Config::load(cli.config.as_deref())?;
        if let Some(url) = &cli.database_url {
            config.database_url = Some(url.clone());
        }
        if let Some(dialect) = cli.dialect {
            config.dialect = Some(dialect);
        }
        if let Some(prefix) = &cli.prefix {
            config.table_prefix = prefix.clone();
        }
        Ok(Self {
            dialect: config.resolve_dialect()?,
            database_url: config.database_url,
            prefix: config.table_prefix,
        })
    }

    async fn connect(&self) -> Result<Database<SqlxConnection>> {
        let Some(url) = &self.database_url else {
            bail!("No database URL. Use --database-url or set SQLCRAFT_DATABASE_URL");
        };
        let connection = SqlxConnection::connect(url)
            .await
            .with_context(|| format!("connecting to {}", redact(url)))?;
        Ok(Database::new(connection, self.dialect.driver(&self.prefix)))
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sqlcraft=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let settings = Settings::resolve(cli)?;

    match &cli.command {
        Commands::Reflect { table } => {
            let db = settings.connect().await?;
            let reflected = db.reflect(table).await?;
            println!("{}", serde_json::to_string_pretty(reflected.as_ref())?);
        }
        Commands::Ddl { schema } => {
            let table = read_table(schema)?;
            let driver = settings.dialect.driver(&settings.prefix);
            for statement in driver.table_statements(&table)? {
                println!("{};", statement);
            }
        }
        Commands::Apply { schema } => {
            let table = read_table(schema)?;
            let db = settings.connect().await?;
            let statements = db.apply_ddl(&table).await?;
            if statements.is_empty() {
                println!("{} {} is up to date", "✓".green(), table.name.cyan());
            } else {
                for statement in &statements {
                    println!("  {}", statement.dimmed());
                }
                println!(
                    "{} Applied {} statement(s) to {}",
                    "✓".green(),
                    statements.len(),
                    table.name.cyan()
                );
            }
        }
    }

    Ok(())
}

fn read_table(path: &Path) -> Result<Table> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let table: Table = serde_json::from_str(&content)
        .with_context(|| format!("parsing table definition {}", path.display()))?;
    table.validate()?;
    Ok(table)
}

/// Hide the password part of a connection URL.
fn redact(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            let credentials = &url[scheme_end + 3..at];
            match credentials.split_once(':') {
                Some((user, _)) => format!("{}{}:***{}", &url[..scheme_end + 3], user, &url[at..]),
                None => url.to_string(),
            }
        }
        _ => url.to_string(),
    }
}
