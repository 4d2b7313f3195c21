use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod collect;
mod resort;
mod runs;

#[derive(Debug, Parser)]
#[command(name = "snowdb-cli")]
#[command(about = "Ski resort conditions collector")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one collection batch across the configured resorts
    Collect(collect::CollectArgs),
    /// Inspect configured resorts and their stored conditions
    Resort {
        #[command(subcommand)]
        command: resort::ResortCommands,
    },
    /// Inspect recorded collection runs
    Runs {
        #[command(subcommand)]
        command: runs::RunsCommands,
    },
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check that the database is reachable
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("snowdb-cli: no command given, see --help");
        return Ok(());
    };

    let config = snowdb_core::load_app_config()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let pool_config = snowdb_db::PoolConfig::from_app_config(&config);

    match command {
        Commands::Collect(args) => collect::run_collect(&config, &args).await,
        Commands::Resort { command } => resort::run_resort(&config, pool_config, command).await,
        Commands::Runs { command } => {
            let pool = snowdb_db::connect_pool(&config.database_url, pool_config).await?;
            runs::run_runs(&pool, command).await
        }
        Commands::Db { command } => {
            let pool = snowdb_db::connect_pool(&config.database_url, pool_config).await?;
            match command {
                DbCommands::Ping => {
                    snowdb_db::ping(&pool).await?;
                    println!("database ok");
                }
                DbCommands::Migrate => {
                    let applied = snowdb_db::run_migrations(&pool).await?;
                    println!("applied {applied} migrations");
                }
            }
            Ok(())
        }
    }
}
