use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use examsim::config::Config;
use examsim::embedding::{download, EmbeddingModel, OnnxEmbedder};
use examsim::models::{Paper, VectorizedPaper};
use examsim::output::terminal;
use examsim::pipeline::{self, PaperInput, Pipeline};
use examsim::report::{RecordingReporter, Reporter, TracingReporter, Warning};

/// examsim: find reused questions between two exam papers.
///
/// Cleans rich-text questions, embeds them with a local sentence-transformer,
/// and ranks question pairs by fused cosine/euclidean similarity.
#[derive(Parser)]
#[command(name = "examsim", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Cleaning flags shared by `clean` and `run`.
#[derive(Args, Clone)]
struct CleanArgs {
    /// Keep repeated questions within a paper
    #[arg(long)]
    no_dedup: bool,

    /// Maximum segment length in characters (default: 500 or EXAMSIM_MAX_SEGMENT_LENGTH)
    #[arg(long)]
    max_segment_length: Option<usize>,
}

/// Matching flags shared by `compare` and `run`.
#[derive(Args, Clone)]
struct MatchArgs {
    /// Minimum fused similarity for a reported pair (default: 0.7)
    #[arg(long)]
    threshold: Option<f64>,

    /// Weight of cosine similarity in the fused score (default: 0.6)
    #[arg(long)]
    weight: Option<f64>,

    /// Compare questions of different types too
    #[arg(long)]
    ignore_type: bool,

    /// Number of pairs to list in the terminal (default: 20)
    #[arg(long, default_value = "20")]
    limit: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean a question file into a deduplicated, segmented paper
    Clean {
        /// JSON array of question records
        input: PathBuf,

        /// Where to write the cleaned paper
        #[arg(short, long)]
        output: PathBuf,

        /// Paper id used in fingerprints (default: the input file name)
        #[arg(long)]
        paper_id: Option<String>,

        #[command(flatten)]
        clean: CleanArgs,
    },

    /// Attach sentence embeddings to a cleaned paper
    Vectorize {
        /// Cleaned paper written by `clean`
        input: PathBuf,

        /// Where to write the vectorized paper
        #[arg(short, long)]
        output: PathBuf,

        /// Embedding model: sentence-bert, bert or bge
        #[arg(long)]
        model: Option<EmbeddingModel>,
    },

    /// Compare two vectorized papers and rank similar question pairs
    Compare {
        paper_a: PathBuf,
        paper_b: PathBuf,

        /// Where to write the comparison result
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        matching: MatchArgs,
    },

    /// Clean, vectorize and compare two question files in one go
    Run {
        input_a: PathBuf,
        input_b: PathBuf,

        /// Where to write the comparison result
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Keep intermediate papers in this directory instead of a temp dir
        #[arg(long)]
        artifacts: Option<PathBuf>,

        /// Paper id for the first file (default: its file name)
        #[arg(long)]
        paper_id_a: Option<String>,

        /// Paper id for the second file (default: its file name)
        #[arg(long)]
        paper_id_b: Option<String>,

        /// Embedding model: sentence-bert, bert or bge
        #[arg(long)]
        model: Option<EmbeddingModel>,

        #[command(flatten)]
        clean: CleanArgs,

        #[command(flatten)]
        matching: MatchArgs,
    },

    /// Download the ONNX files for an embedding model
    DownloadModel {
        /// Embedding model: sentence-bert, bert or bge
        #[arg(long)]
        model: Option<EmbeddingModel>,
    },
}

/// Logs every event and keeps the warnings for the end-of-run tally.
#[derive(Default)]
struct CliReporter {
    log: TracingReporter,
    recorded: RecordingReporter,
}

impl Reporter for CliReporter {
    fn warn(&self, warning: Warning) {
        self.log.warn(warning.clone());
        self.recorded.warn(warning);
    }

    fn progress(&self, message: &str) {
        self.log.progress(message);
    }
}

impl CleanArgs {
    fn apply(&self, config: &mut Config) {
        if self.no_dedup {
            config.deduplicate = false;
        }
        if let Some(len) = self.max_segment_length {
            config.max_segment_length = len;
        }
    }
}

impl MatchArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(t) = self.threshold {
            config.threshold = t;
        }
        if let Some(w) = self.weight {
            config.cosine_weight = w;
        }
        if self.ignore_type {
            config.type_sensitive = false;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("examsim=info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::load()?;
    let reporter = CliReporter::default();

    match cli.command {
        Commands::Clean {
            input,
            output,
            paper_id,
            clean,
        } => {
            clean.apply(&mut config);
            let pipeline = Pipeline::from_config(&config)?;

            let paper = pipeline.clean_file(&input, paper_id.as_deref(), &reporter)?;
            pipeline::write_json(&output, &paper)?;

            terminal::display_paper_summary(&paper);
            println!("\nCleaned paper written to {}", output.display());
        }

        Commands::Vectorize {
            input,
            output,
            model,
        } => {
            if let Some(model) = model {
                config.model = model;
            }
            let pipeline = Pipeline::from_config(&config)?;
            let embedder = load_embedder(&config)?;

            let paper: Paper = pipeline::read_json(&input)?;
            let vectorized = pipeline.vectorize(paper, &embedder, &reporter).await;
            pipeline::write_json(&output, &vectorized)?;

            terminal::display_vectorized_summary(&vectorized);
            println!("\nVectorized paper written to {}", output.display());
        }

        Commands::Compare {
            paper_a,
            paper_b,
            output,
            matching,
        } => {
            matching.apply(&mut config);
            let pipeline = Pipeline::from_config(&config)?;

            let a: VectorizedPaper = pipeline::read_json(&paper_a)?;
            let b: VectorizedPaper = pipeline::read_json(&paper_b)?;
            let result = pipeline.compare(&a, &b, &reporter)?;

            terminal::display_comparison(&result, matching.limit);
            write_result(output.as_deref(), &result)?;
        }

        Commands::Run {
            input_a,
            input_b,
            output,
            artifacts,
            paper_id_a,
            paper_id_b,
            model,
            clean,
            matching,
        } => {
            if let Some(model) = model {
                config.model = model;
            }
            clean.apply(&mut config);
            matching.apply(&mut config);
            let pipeline = Pipeline::from_config(&config)?;
            let embedder = load_embedder(&config)?;

            let result = pipeline
                .run(
                    PaperInput::new(&input_a).with_paper_id(paper_id_a.as_deref()),
                    PaperInput::new(&input_b).with_paper_id(paper_id_b.as_deref()),
                    &embedder,
                    artifacts.as_deref(),
                    &reporter,
                )
                .await?;

            terminal::display_comparison(&result, matching.limit);
            write_result(output.as_deref(), &result)?;
            if let Some(dir) = artifacts {
                println!("Intermediate papers kept in {}", dir.display());
            }
        }

        Commands::DownloadModel { model } => {
            let model = model.unwrap_or(config.model);

            println!("Downloading ONNX model files...");
            println!("  Destination: {}", config.model_root.display());

            download::download_model(&config.model_root, model).await?;

            println!("\n{}", "Model downloaded successfully.".bold());
            println!("You can now run `examsim run <paper_a> <paper_b> --model {model}`.");
        }
    }

    terminal::display_warning_summary(&reporter.recorded.warnings());
    Ok(())
}

/// Build the ONNX embedder for the configured model.
fn load_embedder(config: &Config) -> Result<OnnxEmbedder> {
    config.require_model()?;
    info!(model = %config.model, "Loading embedding model");
    OnnxEmbedder::load(config.model, &config.model_dir())
}

fn write_result(output: Option<&Path>, result: &examsim::models::ComparisonResult) -> Result<()> {
    if let Some(path) = output {
        pipeline::write_json(path, result)?;
        println!("Comparison written to {}", path.display());
    }
    Ok(())
}
