//! This module contains the main entrypoint to the gradecast cli.

use clap::Clap;
use colored::Colorize;
use gradecast_core::Progress;
use std::path::PathBuf;

#[derive(Clap)]
#[clap(
	about = "Predict which restaurants' next inspection will fall below grade C.",
	setting = clap::AppSettings::DisableHelpSubcommand,
)]
enum Options {
	#[clap(name = "run")]
	Run(Box<RunOptions>),
	#[clap(name = "predict")]
	Predict(Box<PredictOptions>),
}

#[derive(Clap, Debug)]
#[clap(about = "run the full workflow")]
#[clap(
	long_about = "run the full workflow: load and normalize both tables, train the default model, grid search the hyperparameters, characterize the best configuration, and predict on the test table"
)]
struct RunOptions {
	#[clap(long, about = "the path or url of the training csv")]
	file_train: Option<String>,
	#[clap(long, about = "the path or url of the test csv")]
	file_test: Option<String>,
	#[clap(short, long, about = "the path to a config file")]
	config: Option<PathBuf>,
	#[clap(short, long, about = "the directory to write the outputs to")]
	output: Option<PathBuf>,
	#[clap(long = "no-progress", about = "disable progress messages", parse(from_flag = std::ops::Not::not))]
	progress: bool,
}

#[derive(Clap, Debug)]
#[clap(about = "apply a saved model to a test csv")]
struct PredictOptions {
	#[clap(short, long, about = "the path to a model.json written by the run command")]
	model: PathBuf,
	#[clap(long, about = "the path or url of the test csv")]
	file_test: String,
	#[clap(short, long, about = "the path to write the predictions to")]
	output: Option<PathBuf>,
	#[clap(long = "no-progress", about = "disable progress messages", parse(from_flag = std::ops::Not::not))]
	progress: bool,
}

fn main() {
	let options = Options::parse();
	let result = match options {
		Options::Run(options) => cli_run(*options),
		Options::Predict(options) => cli_predict(*options),
	};
	if let Err(error) = result {
		eprintln!("{}: {:?}", "error".red().bold(), error);
		std::process::exit(1);
	}
}

fn cli_run(options: RunOptions) -> anyhow::Result<()> {
	let progress_enabled = options.progress;
	let report = gradecast_core::run(
		gradecast_core::RunOptions {
			train_source: options.file_train,
			test_source: options.file_test,
			config_path: options.config,
			output_dir: options.output,
		},
		&mut progress_printer(progress_enabled),
	)?;
	print!("{}", report);
	Ok(())
}

fn cli_predict(options: PredictOptions) -> anyhow::Result<()> {
	let progress_enabled = options.progress;
	let n_predictions = gradecast_core::run_predict(
		gradecast_core::PredictOptions {
			model_path: options.model,
			test_source: options.file_test,
			output_path: options.output,
		},
		&mut progress_printer(progress_enabled),
	)?;
	println!("wrote {} predictions", n_predictions);
	Ok(())
}

fn progress_printer(enabled: bool) -> impl FnMut(Progress) {
	move |progress| {
		if enabled {
			eprintln!("{}", progress);
		}
	}
}
