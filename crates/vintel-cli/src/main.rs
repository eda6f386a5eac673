use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use vintel_core::content::ContentModuleType;
use vintel_infrastructure::{ConfigService, VintelPaths};

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "vintel")]
#[command(about = "Visitor Intel - live AI conversation feed and SEO content dashboard", long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.config/vintel/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also write logs to a daily rolling file in the logs directory
    #[arg(long, global = true)]
    log_file: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Follow the live conversation feed
    Watch {
        /// Render HTML fragments instead of terminal text
        #[arg(long)]
        html: bool,
        /// Never use the push channel
        #[arg(long)]
        poll_only: bool,
        /// Render once after the first load and exit
        #[arg(long)]
        once: bool,
    },
    /// Manually start a conversation
    Start,
    /// Request an investigation report about a feed message
    Investigate {
        message_id: String,
        /// Render the report as HTML
        #[arg(long)]
        html: bool,
        /// Save the report to a file instead of printing it
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Manage generated SEO content
    Content {
        #[command(subcommand)]
        action: ContentCommand,
    },
    /// Inspect or create the config file
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Subcommand)]
enum ContentCommand {
    /// Show the status of every content module
    Status,
    /// Generate content for a module
    Generate {
        #[arg(value_parser = commands::content::parse_module)]
        module: ContentModuleType,
    },
    /// Print generated content
    View {
        #[arg(value_parser = commands::content::parse_module)]
        module: ContentModuleType,
    },
    /// Save generated content to a file
    Download {
        #[arg(value_parser = commands::content::parse_module)]
        module: ContentModuleType,
        /// Output path (defaults to the server-suggested file name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Delete generated content
    Delete {
        #[arg(value_parser = commands::content::parse_module)]
        module: ContentModuleType,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let service = match cli.config {
        Some(path) => ConfigService::new(path),
        None => ConfigService::at_default_location()?,
    };

    // `config init` must work even when the current file is invalid.
    if let Commands::Config {
        action: ConfigCommand::Init { force },
    } = cli.command
    {
        return commands::config::init(&service, force);
    }

    let config = service.get_config()?;
    let log_dir = if cli.log_file {
        Some(VintelPaths::logs_dir()?)
    } else {
        None
    };
    let _log_guard = logging::init(&config.log_filter, log_dir.as_deref())?;

    match cli.command {
        Commands::Watch {
            html,
            poll_only,
            once,
        } => {
            commands::watch::run(
                &config,
                commands::watch::WatchOptions {
                    html,
                    poll_only,
                    once,
                },
            )
            .await?
        }
        Commands::Start => commands::start::run(&config).await?,
        Commands::Investigate {
            message_id,
            html,
            output,
        } => {
            commands::investigate::run(
                &config,
                &message_id,
                commands::investigate::InvestigateOptions { html, output },
            )
            .await?
        }
        Commands::Content { action } => match action {
            ContentCommand::Status => commands::content::status(&config).await?,
            ContentCommand::Generate { module } => {
                commands::content::generate(&config, module).await?
            }
            ContentCommand::View { module } => commands::content::view(&config, module).await?,
            ContentCommand::Download { module, output } => {
                commands::content::download(&config, module, output).await?
            }
            ContentCommand::Delete { module, yes } => {
                commands::content::delete(&config, module, yes).await?
            }
        },
        Commands::Config { action } => match action {
            ConfigCommand::Show => commands::config::show(&service, &config)?,
            ConfigCommand::Init { .. } => {}
        },
    }

    Ok(())
}
