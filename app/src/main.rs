mod app;
mod report;
mod script;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kickform::{FileStore, PipelineConfig, eval};
use tracing_subscriber::EnvFilter;

use app::{App, describe_load};

#[derive(Parser, Debug)]
#[command(name = "kickform")]
#[command(about = "Real-time feedback on free-kick posture with an online k-NN model")]
struct Args {
    /// TOML file with pipeline settings
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory the model is stored in
    #[arg(short, long, global = true, default_value = "models")]
    store: PathBuf,

    /// Key the model is saved under (overrides the config file)
    #[arg(long, global = true)]
    key: Option<String>,

    /// Seed for tip selection
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Drive the pipeline from a JSON Lines script of frames and captures
    Replay {
        script: PathBuf,
        /// Start from an empty model instead of the stored one
        #[arg(long)]
        fresh: bool,
    },
    /// Learn every sample of a dataset and save the model
    Train { dataset: PathBuf },
    /// Train on the first 80% of a dataset and test on the rest
    Evaluate {
        dataset: PathBuf,
        /// Neighbors to vote with (overrides `eval_k`)
        #[arg(short, long)]
        k: Option<usize>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &Args) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(key) = &args.key {
        config.model_key = key.clone();
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);
    let config = load_config(&args)?;
    let store = FileStore::new(&args.store);

    match &args.command {
        Command::Replay { script, fresh } => {
            let text = fs::read_to_string(script)
                .with_context(|| format!("failed to read script {}", script.display()))?;
            let events = script::parse_script(&text)?;
            let mut app = App::new(&config, store, args.seed)?;
            if !fresh {
                let outcome = app.load()?;
                println!("{}", describe_load(&outcome));
            }
            app.replay(&events)?;
        }
        Command::Train { dataset } => {
            let samples = eval::load_dataset(dataset)?;
            let mut app = App::new(&config, store, args.seed)?;
            let outcome = app.load()?;
            println!("{}", describe_load(&outcome));
            let learned = app.train(&samples)?;
            app.save()?;
            println!(
                "learned {learned} samples, model now holds {} examples",
                app.pipeline().classifier().len()
            );
        }
        Command::Evaluate { dataset, k } => {
            let samples = eval::load_dataset(dataset)?;
            let evaluation = eval::evaluate(&samples, k.unwrap_or(config.eval_k))?;
            println!("{}", report::render_evaluation(&evaluation));
        }
    }
    Ok(())
}
