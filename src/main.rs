//! hyperleaf command line entry point.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use hyperleaf::{AnalysisRequest, AppConfig, Pipeline};

#[derive(Parser)]
#[command(name = "hyperleaf")]
#[command(author, version, about = "Hyperspectral leaf health analysis", long_about = None)]
struct Cli {
    /// More verbose logging (repeat for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a spectral cube and print the result as JSON
    Analyze {
        /// Reflectance cube (.npy, height x width x bands)
        cube: PathBuf,
        /// Per-pixel labels (.npy, height x width, 0 = unlabeled)
        #[arg(short, long)]
        labels: Option<PathBuf>,
        /// Directory for the rendered figure
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
        /// Skip the language-model summary
        #[arg(long)]
        no_ai: bool,
        /// Id used in the figure file name
        #[arg(long)]
        request_id: Option<String>,
    },
    /// Print the effective configuration
    Config {
        /// Also write it to the default config path
        #[arg(long)]
        save: bool,
    },
}

fn load_config(path: Option<&Path>) -> Result<AppConfig, hyperleaf::ConfigError> {
    match path {
        Some(path) => AppConfig::load(path),
        None => Ok(AppConfig::load_from_default_path()?.unwrap_or_default()),
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(cli.config.as_deref())?;

    env_logger::Builder::new()
        .filter_level(config.log_level.raised(cli.verbose).to_level_filter())
        .parse_default_env()
        .init();

    match cli.command {
        Commands::Analyze {
            cube,
            labels,
            out_dir,
            no_ai,
            request_id,
        } => {
            if let Some(dir) = out_dir {
                config.output.dir = dir;
            }
            if no_ai {
                config.llm.enabled = false;
            }

            let mut request = AnalysisRequest::from_paths(&cube, labels.as_deref())?;
            request.request_id = request_id;

            let result = Pipeline::from_config(config).run(&request)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Config { save } => {
            if save {
                let path = config.save_to_default_path()?;
                log::info!("Configuration written to {:?}", path);
            }
            println!("{}", config.to_json()?);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
