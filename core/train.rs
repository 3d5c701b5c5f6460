use crate::{
	config::Config,
	test::{split_train_test, test_binary_classifier},
	Progress, Result,
};
use ndarray::prelude::*;
use seatcast_dataset::{BookingFeatureRecord, SynthesisOptions, Synthesizer};
use seatcast_features::{EncoderState, FEATURE_COLUMNS};
use seatcast_tree::{BinaryClassifier, TrainOptions, TrainProgress};
use seatcast_util::finite::{Finite, ToFinite};
use std::cmp::Reverse;

/// Everything [`train`](fn.train.html) needs to produce a pipeline. `seed` drives the synthesizer, the train/test split and the tree ensemble, so the same options always produce the same pipeline.
#[derive(Clone, Debug)]
pub struct PipelineOptions {
	pub n_samples: usize,
	pub seed: u64,
	pub test_fraction: f32,
	pub synthesis: SynthesisOptions,
	/// The `seed` field of these options is replaced by `PipelineOptions::seed` when training.
	pub tree: TrainOptions,
}

impl Default for PipelineOptions {
	fn default() -> Self {
		Self {
			n_samples: 1000,
			seed: 42,
			test_fraction: 0.2,
			synthesis: SynthesisOptions::default(),
			tree: TrainOptions::default(),
		}
	}
}

impl PipelineOptions {
	/// Start from the defaults and override every field the config sets.
	pub fn from_config(config: Option<&Config>) -> Self {
		let mut options = Self::default();
		let config = match config {
			Some(config) => config,
			None => return options,
		};
		if let Some(n_samples) = config.n_samples {
			options.n_samples = n_samples;
		}
		if let Some(seed) = config.seed {
			options.seed = seed;
		}
		if let Some(test_fraction) = config.test_fraction {
			options.test_fraction = test_fraction;
		}
		if let Some(synthesis) = config.synthesis.as_ref() {
			options.synthesis = synthesis.clone();
		}
		if let Some(tree) = config.tree.as_ref() {
			if let Some(n_trees) = tree.n_trees {
				options.tree.n_trees = n_trees;
			}
			if tree.max_depth.is_some() {
				options.tree.max_depth = tree.max_depth;
			}
			if let Some(min_examples_per_split) = tree.min_examples_per_split {
				options.tree.min_examples_per_split = min_examples_per_split;
			}
			if let Some(min_examples_per_leaf) = tree.min_examples_per_leaf {
				options.tree.min_examples_per_leaf = min_examples_per_leaf;
			}
			if let Some(max_features) = tree.max_features {
				options.tree.max_features = max_features.into();
			}
			if let Some(bootstrap) = tree.bootstrap {
				options.tree.bootstrap = bootstrap;
			}
		}
		options
	}
}

/// The importance of one encoded column.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FeatureImportance {
	pub feature: String,
	pub importance: f32,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct TrainingReport {
	pub n_samples: usize,
	pub n_train: usize,
	pub n_test: usize,
	pub train_accuracy: f32,
	pub test_accuracy: f32,
	pub test_log_loss: f32,
	/// Sorted by descending importance.
	pub feature_importance: Vec<FeatureImportance>,
}

/**
A `TrainedPipeline` is the fitted encoder, the tree ensemble trained against its codes and the report from evaluating them. It is never modified after [`train`](fn.train.html) returns it. Retraining produces a new pipeline.
*/
#[derive(Clone, Debug)]
pub struct TrainedPipeline {
	pub encoder: EncoderState,
	pub model: BinaryClassifier,
	pub report: TrainingReport,
}

impl TrainedPipeline {
	/// Return the probability in `[0, 1]` that the booking is confirmed.
	pub fn predict_probability(&self, record: &BookingFeatureRecord) -> Result<f32> {
		record.validate()?;
		let features = self.encoder.transform(record)?;
		Ok(self
			.model
			.predict_probability(ArrayView1::from(&features[..]))?)
	}
}

/// Synthesize a corpus, fit the encoder, train the ensemble on the training partition and evaluate it on both partitions.
pub fn train(
	options: &PipelineOptions,
	update_progress: &mut dyn FnMut(Progress),
) -> Result<TrainedPipeline> {
	let synthesizer = Synthesizer::new(options.synthesis.clone())?;
	update_progress(Progress::Synthesizing {
		n_samples: options.n_samples,
	});
	let records = synthesizer.generate(options.n_samples, options.seed);
	tracing::info!(
		n_samples = records.len(),
		n_confirmed = records.iter().filter(|record| record.confirmed).count(),
		"synthesized training corpus"
	);

	// The encoder is fit on the whole corpus so that every category the synthesizer can emit has a code, even if it only landed in the test partition.
	update_progress(Progress::FittingEncoder);
	let encoder = EncoderState::fit(&records)?;
	let features = encoder.transform_corpus(&records)?;
	let labels: Vec<bool> = records.iter().map(|record| record.confirmed).collect();

	let split = split_train_test(records.len(), options.test_fraction, options.seed)?;
	let features_train = features.select(Axis(0), &split.train_index);
	let labels_train = select_labels(&labels, &split.train_index);
	let features_test = features.select(Axis(0), &split.test_index);
	let labels_test = select_labels(&labels, &split.test_index);

	let tree_options = TrainOptions {
		seed: options.seed,
		..options.tree.clone()
	};
	let model = BinaryClassifier::train(
		features_train.view(),
		&labels_train,
		&tree_options,
		&mut |progress| match progress {
			TrainProgress::Training(progress_counter) => {
				update_progress(Progress::Training(progress_counter))
			}
		},
	)?;

	update_progress(Progress::Testing {
		n_test: split.test_index.len(),
	});
	let train_metrics = test_binary_classifier(&model, features_train.view(), &labels_train)?;
	let test_metrics = test_binary_classifier(&model, features_test.view(), &labels_test)?;
	let report = TrainingReport {
		n_samples: records.len(),
		n_train: split.train_index.len(),
		n_test: split.test_index.len(),
		train_accuracy: train_metrics.accuracy,
		test_accuracy: test_metrics.accuracy,
		test_log_loss: test_metrics.log_loss,
		feature_importance: rank_feature_importances(&model.feature_importances),
	};
	tracing::info!(
		train_accuracy = report.train_accuracy,
		test_accuracy = report.test_accuracy,
		test_log_loss = report.test_log_loss,
		"trained booking confirmation model"
	);
	Ok(TrainedPipeline {
		encoder,
		model,
		report,
	})
}

/// Train a pipeline with default options on `n_samples` synthetic records generated with `seed`.
pub fn train_from_scratch(n_samples: usize, seed: u64) -> Result<TrainedPipeline> {
	let options = PipelineOptions {
		n_samples,
		seed,
		..Default::default()
	};
	train(&options, &mut |_| {})
}

fn select_labels(labels: &[bool], index: &[usize]) -> Vec<bool> {
	index.iter().map(|i| labels[*i]).collect()
}

fn rank_feature_importances(importances: &[f32]) -> Vec<FeatureImportance> {
	let mut ranked: Vec<(&str, Option<Finite<f32>>)> = FEATURE_COLUMNS
		.iter()
		.zip(importances.iter())
		.map(|(feature, importance)| (*feature, importance.to_finite().ok()))
		.collect();
	// Non finite importances sort last.
	ranked.sort_by_key(|(_, importance)| Reverse(*importance));
	ranked
		.into_iter()
		.map(|(feature, importance)| FeatureImportance {
			feature: feature.to_owned(),
			importance: importance.map(Finite::get).unwrap_or(0.0),
		})
		.collect()
}

#[cfg(test)]
fn small_options() -> PipelineOptions {
	PipelineOptions {
		n_samples: 300,
		tree: TrainOptions {
			n_trees: 10,
			..Default::default()
		},
		..Default::default()
	}
}

#[test]
fn test_train_reports_consistent_sizes() {
	let pipeline = train(&small_options(), &mut |_| {}).unwrap();
	let report = &pipeline.report;
	assert_eq!(report.n_samples, 300);
	assert_eq!(report.n_test, 60);
	assert_eq!(report.n_train, 240);
	assert!((0.0..=1.0).contains(&report.train_accuracy));
	assert!((0.0..=1.0).contains(&report.test_accuracy));
	assert!(report.test_log_loss >= 0.0);
	assert_eq!(report.feature_importance.len(), FEATURE_COLUMNS.len());
	for pair in report.feature_importance.windows(2) {
		assert!(pair[0].importance >= pair[1].importance);
	}
	let total: f32 = report.feature_importance.iter().map(|f| f.importance).sum();
	assert!((total - 1.0).abs() < 1e-4);
}

#[test]
fn test_train_reports_progress_in_order() {
	let mut phases = Vec::new();
	train(&small_options(), &mut |progress| {
		phases.push(match progress {
			Progress::Synthesizing { .. } => "synthesizing",
			Progress::FittingEncoder => "fitting_encoder",
			Progress::Training(_) => "training",
			Progress::Testing { .. } => "testing",
		})
	})
	.unwrap();
	assert_eq!(
		phases,
		vec!["synthesizing", "fitting_encoder", "training", "testing"]
	);
}

#[test]
fn test_train_is_deterministic() {
	let a = train(&small_options(), &mut |_| {}).unwrap();
	let b = train(&small_options(), &mut |_| {}).unwrap();
	assert_eq!(a.report.test_accuracy, b.report.test_accuracy);
	assert_eq!(a.report.feature_importance, b.report.feature_importance);
}

#[test]
fn test_train_rejects_bad_test_fraction() {
	let options = PipelineOptions {
		test_fraction: 1.5,
		..small_options()
	};
	assert!(matches!(
		train(&options, &mut |_| {}),
		Err(crate::Error::InvalidConfig(_))
	));
}

#[test]
fn test_options_from_config() {
	let config = Config::from_yaml("n_samples: 50\ntree:\n  n_trees: 3\n  max_features: all\n").unwrap();
	let options = PipelineOptions::from_config(Some(&config));
	assert_eq!(options.n_samples, 50);
	assert_eq!(options.seed, 42);
	assert_eq!(options.tree.n_trees, 3);
	assert_eq!(options.tree.max_features, seatcast_tree::MaxFeatures::All);
	assert_eq!(PipelineOptions::from_config(None).n_samples, 1000);
}
