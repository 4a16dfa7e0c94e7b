// cloudopt: cloud cost optimization recommendations
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cloudopt::cli::{Cli, Commands};
use cloudopt::commands::{
    handle_analyze_command, handle_config_action, handle_export_command, handle_logs_command,
    handle_recommendations_command,
    handle_review_command, handle_sessions_command, handle_stats_command, open_database,
};
use cloudopt::config::settings::LOG_ENV;
use cloudopt::config::Config;

/// Level from CLOUDOPT_LOG, else -v, else the config file
fn init_logging(config: &Config, verbose: bool) {
    let from_env = std::env::var(LOG_ENV).is_ok_and(|v| !v.trim().is_empty());
    let directive = if verbose && !from_env {
        "debug"
    } else {
        config.logging.level.as_str()
    };

    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = match cli.config.clone() {
        Some(path) => path,
        None => Config::default_path()?,
    };

    let mut config = match Config::load_from(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: Failed to load configuration: {e:#}");
            std::process::exit(1);
        }
    };
    config.apply_env_overrides();
    init_logging(&config, cli.verbose);

    // CLI override takes precedence
    let colored = cli.colored || config.output.colored;
    let list_limit = config.output.list_limit;

    match cli.command {
        Commands::Analyze(args) => {
            let database = if args.no_save { None } else { Some(open_database(&config)?) };
            handle_analyze_command(args, &config, database.as_ref(), cli.json).await?;
        }
        Commands::Recommendations { limit, status, resource_type } => {
            let database = open_database(&config)?;
            handle_recommendations_command(
                &database,
                limit.unwrap_or(list_limit),
                status,
                resource_type,
                cli.json,
                colored,
            )?;
        }
        Commands::Approve { id } => {
            handle_review_command(&open_database(&config)?, id, true, cli.json)?;
        }
        Commands::Reject { id } => {
            handle_review_command(&open_database(&config)?, id, false, cli.json)?;
        }
        Commands::Stats => {
            handle_stats_command(&open_database(&config)?, cli.json, colored)?;
        }
        Commands::Sessions { limit } => {
            handle_sessions_command(&open_database(&config)?, limit.unwrap_or(list_limit), cli.json, colored)?;
        }
        Commands::Logs { limit } => {
            handle_logs_command(&open_database(&config)?, limit.unwrap_or(list_limit), cli.json, colored)?;
        }
        Commands::Export { format, output } => {
            handle_export_command(&open_database(&config)?, format, output, cli.json)?;
        }
        Commands::Config { action } => {
            handle_config_action(action, &config_path, cli.json)?;
        }
    }

    Ok(())
}
