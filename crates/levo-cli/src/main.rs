//! levo CLI - build and publish the guest component.

mod args;
mod build;
mod colors;
mod doctor;

use clap::{Parser, Subcommand};

use args::ConfigArgs;

#[derive(Parser)]
#[command(name = "levo")]
#[command(about = "Build the guest crate into a compressed component and publish it")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile, adapt, introspect and publish (default)
    Build {
        #[command(flatten)]
        config: ConfigArgs,

        /// Print the build report as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Check that the tools and adapter are available
    Doctor {
        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Print the resolved configuration as TOML
    Config {
        #[command(flatten)]
        config: ConfigArgs,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Helper to format levo-core errors with recovery hints
    let format_error = |err: anyhow::Error| -> anyhow::Error {
        if let Some(levo_err) = err.downcast_ref::<levo_core::Error>() {
            anyhow::anyhow!("{}", levo_err.with_hint())
        } else {
            err
        }
    };

    let command = cli.command.unwrap_or(Commands::Build {
        config: ConfigArgs::default(),
        json: false,
    });

    match command {
        Commands::Build { config, json } => {
            let config = config.resolve().map_err(format_error)?;
            build::execute(config, json).map_err(format_error)?;
        }

        Commands::Doctor { config } => {
            let config = config.resolve().map_err(format_error)?;
            doctor::execute(&config).map_err(format_error)?;
        }

        Commands::Config { config } => {
            let config = config.resolve().map_err(format_error)?;
            print!("{}", config.to_toml().map_err(anyhow::Error::from).map_err(format_error)?);
        }
    }

    Ok(())
}
