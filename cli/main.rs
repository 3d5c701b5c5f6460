//! This module contains the main entrypoint to the seatcast cli.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use seatcast_core::{
	load_config, ConfirmationOutlook, ModelInsights, PipelineOptions, Progress, RawBookingFeatures,
	TrainedPipeline,
};
use seatcast_dataset::Synthesizer;
use std::{
	io::Read,
	path::{Path, PathBuf},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[clap(
	about = "Predict whether a bus booking will be confirmed.",
	version,
	disable_help_subcommand = true
)]
struct Cli {
	#[clap(short, long, global = true, help = "log debug output")]
	verbose: bool,
	#[clap(subcommand)]
	command: Command,
}

#[derive(Subcommand)]
enum Command {
	#[clap(name = "generate")]
	Generate(GenerateArgs),
	#[clap(name = "train")]
	Train(TrainArgs),
	#[clap(name = "predict")]
	Predict(PredictArgs),
}

/// Flags shared by every command that synthesizes a corpus.
#[derive(Args, Debug)]
struct PipelineArgs {
	#[clap(short, long, help = "the path to a config file")]
	config: Option<PathBuf>,
	#[clap(long, help = "the number of bookings to synthesize")]
	samples: Option<usize>,
	#[clap(long, help = "the seed for synthesis, splitting and training")]
	seed: Option<u64>,
}

#[derive(Args, Debug)]
#[clap(about = "write a synthetic booking corpus to a csv file")]
struct GenerateArgs {
	#[clap(flatten)]
	pipeline: PipelineArgs,
	#[clap(
		short,
		long,
		default_value = "mock_booking_dataset.csv",
		help = "the path to write the .csv file to"
	)]
	output: PathBuf,
}

#[derive(Args, Debug)]
#[clap(about = "train a model and report how well it does")]
struct TrainArgs {
	#[clap(flatten)]
	pipeline: PipelineArgs,
	#[clap(long, help = "also write the training corpus to this .csv file")]
	dataset_output: Option<PathBuf>,
	#[clap(
		long,
		default_value = "model_insights.json",
		help = "the path to write the model insights to"
	)]
	insights_output: PathBuf,
}

#[derive(Args, Debug)]
#[clap(about = "train a model and predict the confirmation probability of bookings")]
#[clap(
	long_about = "train a model and predict the confirmation probability of bookings read from a .json file containing one booking or an array of bookings"
)]
struct PredictArgs {
	#[clap(flatten)]
	pipeline: PipelineArgs,
	#[clap(short, long, help = "the path to a .json file, or - to read from stdin")]
	input: PathBuf,
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum PredictInput {
	One(RawBookingFeatures),
	Many(Vec<RawBookingFeatures>),
}

fn main() {
	let cli = Cli::parse();
	init_logging(cli.verbose);
	let result = match cli.command {
		Command::Generate(args) => cli_generate(args),
		Command::Train(args) => cli_train(args),
		Command::Predict(args) => cli_predict(args),
	};
	if let Err(error) = result {
		eprintln!("{}: {:#}", "error".red().bold(), error);
		std::process::exit(1);
	}
}

fn init_logging(verbose: bool) {
	let default_level = if verbose { "debug" } else { "info" };
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
	tracing_subscriber::registry()
		.with(filter)
		.with(tracing_subscriber::fmt::layer().with_target(false))
		.init();
}

fn pipeline_options(args: &PipelineArgs) -> Result<PipelineOptions> {
	let config = load_config(args.config.as_deref()).context("failed to load the config")?;
	let mut options = PipelineOptions::from_config(config.as_ref());
	// Flags take precedence over the config file.
	if let Some(samples) = args.samples {
		options.n_samples = samples;
	}
	if let Some(seed) = args.seed {
		options.seed = seed;
	}
	Ok(options)
}

fn cli_generate(args: GenerateArgs) -> Result<()> {
	let options = pipeline_options(&args.pipeline)?;
	write_dataset(&options, &args.output)?;
	eprintln!("Your dataset was written to {}.", args.output.display());
	Ok(())
}

fn cli_train(args: TrainArgs) -> Result<()> {
	let options = pipeline_options(&args.pipeline)?;
	if let Some(dataset_output) = args.dataset_output.as_deref() {
		write_dataset(&options, dataset_output)?;
	}
	let pipeline = train(&options)?;
	let report = &pipeline.report;
	eprintln!("Training Accuracy: {:.2}%", report.train_accuracy * 100.0);
	eprintln!("Testing Accuracy: {:.2}%", report.test_accuracy * 100.0);
	eprintln!("Feature Importance:");
	for feature_importance in report.feature_importance.iter() {
		eprintln!(
			"  {:<24}{:.4}",
			feature_importance.feature, feature_importance.importance
		);
	}
	ModelInsights::from_report(report)
		.to_path(&args.insights_output)
		.with_context(|| {
			format!(
				"failed to write the model insights to {}",
				args.insights_output.display()
			)
		})?;
	eprintln!(
		"Your model insights were written to {}.",
		args.insights_output.display()
	);
	Ok(())
}

fn cli_predict(args: PredictArgs) -> Result<()> {
	let bookings = read_bookings(&args.input)?;
	let options = pipeline_options(&args.pipeline)?;
	let pipeline = train(&options)?;
	for (index, booking) in bookings.iter().enumerate() {
		let probability = seatcast_core::predict(&pipeline, booking)
			.with_context(|| format!("failed to predict booking {}", index + 1))?;
		println!("Booking {}", index + 1);
		println!("Confirmation Probability: {:.2}%", probability);
		println!("Outlook: {}", ConfirmationOutlook::from_percentage(probability));
	}
	Ok(())
}

fn train(options: &PipelineOptions) -> Result<TrainedPipeline> {
	seatcast_core::train(options, &mut log_progress).context("failed to train the model")
}

fn log_progress(progress: Progress) {
	match progress {
		Progress::Synthesizing { n_samples } => {
			tracing::info!(n_samples, "synthesizing bookings")
		}
		Progress::FittingEncoder => tracing::info!("fitting the feature encoder"),
		Progress::Training(progress_counter) => {
			tracing::info!(n_trees = progress_counter.total(), "training trees")
		}
		Progress::Testing { n_test } => tracing::info!(n_test, "testing the model"),
	}
}

fn write_dataset(options: &PipelineOptions, path: &Path) -> Result<()> {
	let synthesizer =
		Synthesizer::new(options.synthesis.clone()).context("invalid synthesis options")?;
	// The corpus is deterministic in the seed, so this is the same corpus `train` synthesizes.
	let records = synthesizer.generate(options.n_samples, options.seed);
	seatcast_dataset::to_path(path, &records)
		.with_context(|| format!("failed to write the dataset to {}", path.display()))?;
	tracing::info!(n_samples = records.len(), path = %path.display(), "wrote dataset");
	Ok(())
}

fn read_bookings(input: &Path) -> Result<Vec<RawBookingFeatures>> {
	let json = if input == Path::new("-") {
		let mut json = String::new();
		std::io::stdin()
			.read_to_string(&mut json)
			.context("failed to read bookings from stdin")?;
		json
	} else {
		std::fs::read_to_string(input)
			.with_context(|| format!("failed to read {}", input.display()))?
	};
	let input: PredictInput = serde_json::from_str(&json).context("failed to parse bookings")?;
	Ok(match input {
		PredictInput::One(booking) => vec![booking],
		PredictInput::Many(bookings) => bookings,
	})
}
