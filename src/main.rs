//! Ovitrap Screen CLI
//!
//! Command-line entry point for training the egg classifier on a labeled
//! ovitrap image collection and for screening new images with a trained
//! model.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use ovitrap_screen::backend::{backend_name, default_device, DefaultBackend, TrainingBackend};
use ovitrap_screen::utils::logging::{init_logging, LogConfig};
use ovitrap_screen::{
    load_metadata, load_samples, split, EggClassifierConfig, ModelArtifact, Predictor,
    PreprocessConfig, SplitConfig, TrainConfig, DEFAULT_THRESHOLD,
};

/// Ovitrap mosquito egg screening
///
/// Trains a CNN to decide whether an ovitrap image contains dengue-vector
/// mosquito eggs, and screens new images with a trained model.
#[derive(Parser, Debug)]
#[command(name = "ovitrap_screen")]
#[command(version = "0.1.0")]
#[command(about = "Binary mosquito egg detection for ovitrap images", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Train the classifier from a CSV metadata table
    Train {
        /// Path to the metadata CSV (columns: file_path, label)
        #[arg(short, long)]
        metadata: String,

        /// Artifact path stem for the trained model
        #[arg(short, long, default_value = "output/egg_classifier")]
        output: String,

        /// Number of training epochs
        #[arg(short, long, default_value = "10")]
        epochs: usize,

        /// Batch size for training
        #[arg(short, long, default_value = "32")]
        batch_size: usize,

        /// Adam learning rate
        #[arg(short, long, default_value = "0.001")]
        learning_rate: f64,

        /// Fraction of samples held out for validation (0.0-1.0)
        #[arg(long, default_value = "0.2")]
        holdout_fraction: f64,

        /// Random seed for splitting and batch shuffling
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Save an intermediate checkpoint every N epochs
        #[arg(long)]
        checkpoint_interval: Option<usize>,
    },

    /// Classify a single image with a trained model
    Infer {
        /// Path to the input image
        #[arg(short, long)]
        input: String,

        /// Artifact path stem of the trained model
        #[arg(short, long, default_value = "output/egg_classifier")]
        model: String,

        /// Decision threshold on the egg probability (0.0-1.0)
        #[arg(short, long, default_value = "0.5")]
        threshold: f32,
    },

    /// Show statistics for a metadata table
    Stats {
        /// Path to the metadata CSV
        #[arg(short, long)]
        metadata: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };
    let _ = init_logging(&log_config);

    print_banner();

    match cli.command {
        Commands::Train {
            metadata,
            output,
            epochs,
            batch_size,
            learning_rate,
            holdout_fraction,
            seed,
            checkpoint_interval,
        } => {
            cmd_train(
                &metadata,
                &output,
                epochs,
                batch_size,
                learning_rate,
                holdout_fraction,
                seed,
                checkpoint_interval,
            )?;
        }

        Commands::Infer {
            input,
            model,
            threshold,
        } => {
            cmd_infer(&input, &model, threshold)?;
        }

        Commands::Stats { metadata } => {
            cmd_stats(&metadata)?;
        }
    }

    Ok(())
}

fn print_banner() {
    println!(
        "{}",
        r#"
 ╔═══════════════════════════════════════════════════════╗
 ║   Ovitrap Screen                                      ║
 ║   Mosquito egg detection with Burn + Rust             ║
 ╚═══════════════════════════════════════════════════════╝
  "#
        .green()
    );
}

#[allow(clippy::too_many_arguments)]
fn cmd_train(
    metadata: &str,
    output: &str,
    epochs: usize,
    batch_size: usize,
    learning_rate: f64,
    holdout_fraction: f64,
    seed: u64,
    checkpoint_interval: Option<usize>,
) -> Result<()> {
    info!("Training from metadata table: {}", metadata);

    println!("{}", "Training Configuration:".cyan().bold());
    println!("  Metadata:  {}", metadata);
    println!("  Output:    {}", output);
    println!("  Epochs:    {}", epochs);
    println!("  Batch:     {}", batch_size);
    println!("  LR:        {}", learning_rate);
    println!("  Holdout:   {:.0}%", holdout_fraction * 100.0);
    println!("  Seed:      {}", seed);
    println!("  Backend:   {}", backend_name());
    println!();

    if let Some(parent) = Path::new(output).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let preprocess = PreprocessConfig::default();
    let records = load_metadata(metadata)?;
    let samples = load_samples(&records, &preprocess)?;

    println!(
        "  Loaded {} samples ({} positive)",
        samples.len(),
        samples.num_positive()
    );

    let splits = split(
        samples,
        &SplitConfig {
            holdout_fraction,
            seed,
        },
    )?;

    let model_config = EggClassifierConfig::new();
    let train_config = TrainConfig {
        epochs,
        batch_size,
        learning_rate,
        seed,
        checkpoint_interval,
    };
    let artifact = ModelArtifact::at(output);

    let device = default_device();
    let (_model, history) = ovitrap_screen::train::<TrainingBackend>(
        &splits,
        &model_config,
        &preprocess,
        &train_config,
        &artifact,
        &device,
    )?;

    history.save(PathBuf::from(format!("{}_history.json", output)))?;

    println!();
    println!("{}", "Training complete!".green().bold());
    if let Some(last) = history.last() {
        println!(
            "  Final holdout accuracy: {}",
            format!("{:.1}%", last.holdout_accuracy * 100.0).yellow()
        );
    }
    if let Some(best) = history.best_epoch() {
        println!(
            "  Best holdout accuracy:  {:.1}% (epoch {})",
            best.holdout_accuracy * 100.0,
            best.epoch
        );
    }
    println!("  Artifact: {:?}", artifact.weights_path());

    Ok(())
}

fn cmd_infer(input: &str, model: &str, threshold: f32) -> Result<()> {
    info!("Running inference on {}", input);

    println!("{}", "Inference Configuration:".cyan().bold());
    println!("  Input:     {}", input);
    println!("  Model:     {}", model);
    println!("  Threshold: {}", threshold);
    println!("  Backend:   {}", backend_name());
    println!();

    let device = default_device();
    let artifact = ModelArtifact::at(model);
    let mut predictor = Predictor::<DefaultBackend>::load(&artifact, &device)?;
    if (threshold - DEFAULT_THRESHOLD).abs() > f32::EPSILON {
        predictor = predictor.with_threshold(threshold)?;
    }

    let detection = predictor.predict_file(input)?;

    let verdict = if detection.positive {
        "EGGS DETECTED".red().bold()
    } else {
        "no eggs".green()
    };
    println!("  {}", verdict);
    println!("  Probability: {:.1}%", detection.probability * 100.0);

    Ok(())
}

fn cmd_stats(metadata: &str) -> Result<()> {
    info!("Computing metadata statistics for {}", metadata);

    let records = load_metadata(metadata)?;
    let positives = records.iter().filter(|r| r.label == 1).count();
    let missing = records
        .iter()
        .filter(|r| !r.file_path.exists())
        .count();

    println!("{}", "Metadata Statistics:".cyan().bold());
    println!("  Total rows:     {}", records.len());
    if !records.is_empty() {
        println!(
            "  Positive:       {} ({:.1}%)",
            positives,
            100.0 * positives as f64 / records.len() as f64
        );
        println!(
            "  Negative:       {} ({:.1}%)",
            records.len() - positives,
            100.0 * (records.len() - positives) as f64 / records.len() as f64
        );
    }
    if missing > 0 {
        println!(
            "  {} {} referenced files are missing and would train as zero placeholders",
            "Warning:".yellow(),
            missing
        );
    }

    Ok(())
}
