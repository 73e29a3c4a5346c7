use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;

use soil_quality_index::config::AnalysisConfig;
use soil_quality_index::data::loader::load_file;
use soil_quality_index::data::model::{Dataset, ParameterMap};
use soil_quality_index::report::{self, SqiReport};
use soil_quality_index::state::Session;

#[derive(Parser)]
#[command(name = "soil-quality-index")]
#[command(about = "PCA-weighted Soil Quality Index from tabular soil measurements")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print parameter and sample counts of a dataset.
    Summary {
        /// Dataset file (.csv, .json or .parquet).
        file: PathBuf,

        /// Emit JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Derive parameter weights with PCA.
    Pca(AnalysisArgs),

    /// Score one sample against the dataset's PCA weights.
    Sqi {
        #[command(flatten)]
        analysis: AnalysisArgs,

        /// JSON object of parameter values, e.g. {"pH": 6.8}.
        #[arg(long)]
        sample: Option<PathBuf>,

        /// Override one parameter value (repeatable), e.g. --set "Soil pH=6.8".
        #[arg(long = "set", value_name = "NAME=VALUE")]
        set: Vec<String>,
    },
}

#[derive(Debug, Clone, Args)]
struct AnalysisArgs {
    /// Dataset file (.csv, .json or .parquet).
    file: PathBuf,

    /// JSON config file; flags below take precedence.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Power-iteration steps per component.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    iterations: Option<u32>,

    /// Maximum number of principal components.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    components: Option<u32>,

    /// Emit JSON instead of text.
    #[arg(long)]
    json: bool,
}

impl AnalysisArgs {
    fn config(&self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_file(path)?,
            None => AnalysisConfig::default(),
        };
        if let Some(iterations) = self.iterations {
            config.pca.iterations = iterations as usize;
        }
        if let Some(components) = self.components {
            config.pca.max_components = components as usize;
        }
        Ok(config)
    }

    /// Load the dataset and run PCA.
    fn analysed_session(&self) -> Result<Session> {
        let mut session = Session::new(self.config()?);
        session.set_dataset(load_dataset(&self.file)?);
        session.analyse()?;
        Ok(session)
    }
}

fn load_dataset(path: &Path) -> Result<Dataset> {
    let table = load_file(path)?;
    Dataset::from_raw(&table).with_context(|| format!("building dataset from {}", path.display()))
}

fn parse_assignment(text: &str) -> Result<(&str, &str)> {
    match text.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim(), value.trim())),
        _ => bail!("expected NAME=VALUE, got '{text}'"),
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Summary { file, json } => {
            let summary = load_dataset(&file)?.summary();
            if json {
                println!("{}", report::to_json(&summary)?);
            } else {
                print!("{}", report::render_summary(&summary));
            }
        }
        Commands::Pca(args) => {
            let session = args.analysed_session()?;
            let outcome = session.pca.as_ref().context("PCA did not run")?;
            if args.json {
                println!("{}", report::to_json(outcome)?);
            } else {
                print!("{}", report::render_pca(outcome));
            }
        }
        Commands::Sqi {
            analysis,
            sample,
            set,
        } => {
            let mut session = analysis.analysed_session()?;

            if let Some(path) = sample {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading sample {}", path.display()))?;
                let values: ParameterMap = serde_json::from_str(&text)
                    .with_context(|| format!("parsing sample {}", path.display()))?;
                for (name, value) in values.iter() {
                    session.set_value(name, value)?;
                }
            }
            for assignment in &set {
                let (name, value) = parse_assignment(assignment)?;
                session.set_value_text(name, value)?;
            }

            let outcome = session.pca.as_ref().context("PCA did not run")?;
            let result = session.result.as_ref().context("no SQI result")?;
            info!("SQI {} ({})", result.display_sqi(), result.category);
            if analysis.json {
                println!("{}", report::to_json(&SqiReport::new(result, &outcome.weights))?);
            } else {
                print!("{}", report::render_pca(outcome));
                print!("{}", report::render_sqi(result, &outcome.weights));
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    run(Cli::parse())
}
