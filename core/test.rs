use crate::{Error, Result};
use ndarray::prelude::*;
use num_traits::ToPrimitive;
use rand::{seq::SliceRandom, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;
use seatcast_metrics::{Accuracy, BinaryCrossEntropy, BinaryCrossEntropyInput, StreamingMetric};
use seatcast_tree::BinaryClassifier;

/// Row indexes of the training and held out partitions of a corpus. The two partitions are disjoint and together cover every row.
#[derive(Clone, Debug, PartialEq)]
pub struct TrainTestSplit {
	pub train_index: Vec<usize>,
	pub test_index: Vec<usize>,
}

/**
Shuffle the row indexes `0..n` with a generator seeded by `seed` and hold out the first `ceil(test_fraction * n)` of them for testing. The same `n`, `test_fraction` and `seed` always produce the same split.

Both partitions must end up non empty, so `n` must be at least two and `test_fraction` must be strictly between zero and one.
*/
pub fn split_train_test(n: usize, test_fraction: f32, seed: u64) -> Result<TrainTestSplit> {
	if !(test_fraction > 0.0 && test_fraction < 1.0) {
		return Err(Error::InvalidConfig(format!(
			"test_fraction must be between 0 and 1, got {}",
			test_fraction
		)));
	}
	let n_test = (test_fraction * n.to_f32().unwrap_or(0.0))
		.ceil()
		.to_usize()
		.unwrap_or(0);
	if n_test == 0 || n_test >= n {
		return Err(Error::InvalidConfig(format!(
			"cannot split {} samples into non empty train and test partitions with test_fraction {}",
			n, test_fraction
		)));
	}
	let mut index: Vec<usize> = (0..n).collect();
	let mut rng = Xoshiro256Plus::seed_from_u64(seed);
	index.shuffle(&mut rng);
	let train_index = index.split_off(n_test);
	Ok(TrainTestSplit {
		train_index,
		test_index: index,
	})
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct BinaryClassifierTestMetrics {
	pub accuracy: f32,
	pub log_loss: f32,
}

/// Compute the accuracy and log loss of `model` on the rows of `features`.
pub(crate) fn test_binary_classifier(
	model: &BinaryClassifier,
	features: ArrayView2<f32>,
	labels: &[bool],
) -> Result<BinaryClassifierTestMetrics> {
	let probabilities = model.predict_probabilities(features)?;
	let mut accuracy = Accuracy::new();
	let mut log_loss = BinaryCrossEntropy::default();
	for (probability, label) in probabilities.iter().zip(labels.iter()) {
		accuracy.update((*probability > 0.5, *label));
		log_loss.update(BinaryCrossEntropyInput {
			probability: *probability,
			label: *label,
		});
	}
	Ok(BinaryClassifierTestMetrics {
		accuracy: accuracy.finalize().unwrap_or(0.0),
		log_loss: log_loss.finalize().unwrap_or(0.0),
	})
}

#[test]
fn test_split_is_disjoint_and_complete() {
	let split = split_train_test(1000, 0.2, 42).unwrap();
	assert_eq!(split.test_index.len(), 200);
	assert_eq!(split.train_index.len(), 800);
	let mut all: Vec<usize> = split
		.train_index
		.iter()
		.chain(split.test_index.iter())
		.copied()
		.collect();
	all.sort_unstable();
	assert_eq!(all, (0..1000).collect::<Vec<_>>());
}

#[test]
fn test_split_rounds_test_size_up() {
	let split = split_train_test(11, 0.2, 0).unwrap();
	assert_eq!(split.test_index.len(), 3);
	assert_eq!(split.train_index.len(), 8);
}

#[test]
fn test_split_is_deterministic() {
	assert_eq!(
		split_train_test(100, 0.3, 7).unwrap(),
		split_train_test(100, 0.3, 7).unwrap()
	);
	assert_ne!(
		split_train_test(100, 0.3, 7).unwrap(),
		split_train_test(100, 0.3, 8).unwrap()
	);
}

#[test]
fn test_split_rejects_degenerate_partitions() {
	assert!(split_train_test(1, 0.2, 0).is_err());
	assert!(split_train_test(0, 0.2, 0).is_err());
	assert!(split_train_test(100, 0.0, 0).is_err());
	assert!(split_train_test(100, 1.0, 0).is_err());
	assert!(split_train_test(100, f32::NAN, 0).is_err());
}
