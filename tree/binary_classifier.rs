use crate::{
	feature_importances::compute_feature_importances,
	train::{train_tree, TrainTreeOutput},
	PredictError, TrainError, TrainOptions, TrainProgress, Tree,
};
use ndarray::prelude::*;
use num_traits::ToPrimitive;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;
use rayon::prelude::*;
use seatcast_util::progress_counter::ProgressCounter;

/// A binary classifier model is trained to predict binary target values, for example whether a booking will be confirmed or cancelled.
#[derive(Clone, Debug)]
pub struct BinaryClassifier {
	/// The trees for this model.
	pub trees: Vec<Tree>,
	/// The importance of each feature as measured by the mean decrease in impurity across the ensemble. The importances sum to one unless no tree made a split.
	pub feature_importances: Vec<f32>,
	/// The number of features each example must have.
	pub n_features: usize,
}

impl BinaryClassifier {
	/// Train a binary classifier. `features` has one row per example and `labels` has one label per row.
	pub fn train(
		features: ArrayView2<f32>,
		labels: &[bool],
		options: &TrainOptions,
		update_progress: &mut dyn FnMut(TrainProgress),
	) -> Result<Self, TrainError> {
		if features.nrows() != labels.len() {
			return Err(TrainError::LengthMismatch {
				n_rows: features.nrows(),
				n_labels: labels.len(),
			});
		}
		if features.nrows() == 0 {
			return Err(TrainError::EmptyTrainingSet);
		}
		if options.n_trees == 0 {
			return Err(TrainError::NoTrees);
		}
		let n_features = features.ncols();

		// Draw one seed per tree before training any of them, so the trees do not depend on the order rayon runs them in.
		let mut rng = Xoshiro256Plus::seed_from_u64(options.seed);
		let seeds: Vec<u64> = (0..options.n_trees).map(|_| rng.gen()).collect();

		let progress_counter = ProgressCounter::new(options.n_trees.to_u64().unwrap_or(0));
		update_progress(TrainProgress::Training(progress_counter.clone()));
		let outputs: Vec<TrainTreeOutput> = seeds
			.par_iter()
			.map(|seed| {
				let output = train_tree(features, labels, options, *seed);
				progress_counter.inc(1);
				output
			})
			.collect();

		let feature_importances = compute_feature_importances(&outputs, n_features);
		let trees: Vec<Tree> = outputs.into_iter().map(|output| output.tree).collect();
		tracing::debug!(
			n_trees = trees.len(),
			mean_leaves = trees.iter().map(|tree| tree.n_leaves()).sum::<usize>() / trees.len(),
			max_depth = trees.iter().map(|tree| tree.depth()).max().unwrap_or(0),
			"trained tree ensemble"
		);
		Ok(Self {
			trees,
			feature_importances,
			n_features,
		})
	}

	/// Return the probability that the example is positive: the mean of the smoothed leaf probabilities the example reaches in each tree. The result is always strictly inside `(0, 1)`.
	pub fn predict_probability(&self, features: ArrayView1<f32>) -> Result<f32, PredictError> {
		if features.len() != self.n_features {
			return Err(PredictError::FeatureCount {
				expected: self.n_features,
				found: features.len(),
			});
		}
		let features = features.to_vec();
		let sum: f32 = self.trees.iter().map(|tree| tree.predict(&features)).sum();
		let n_trees = self.trees.len().to_f32().unwrap_or(1.0);
		Ok((sum / n_trees).clamp(0.0, 1.0))
	}

	/// Make probability predictions for every row of `features`.
	pub fn predict_probabilities(&self, features: ArrayView2<f32>) -> Result<Array1<f32>, PredictError> {
		features
			.axis_iter(Axis(0))
			.map(|row| self.predict_probability(row))
			.collect::<Result<Vec<f32>, _>>()
			.map(Array1::from)
	}

	/// Predict the label, positive when the probability exceeds one half.
	pub fn predict(&self, features: ArrayView1<f32>) -> Result<bool, PredictError> {
		Ok(self.predict_probability(features)? > 0.5)
	}
}

#[cfg(test)]
fn xor_like_dataset(n: usize, seed: u64) -> (Array2<f32>, Vec<bool>) {
	let mut rng = Xoshiro256Plus::seed_from_u64(seed);
	let features = Array::from_shape_fn((n, 3), |_| rng.gen_range(0.0..1.0f32));
	let labels = features
		.axis_iter(Axis(0))
		.map(|row| (row[0] > 0.5) != (row[1] > 0.5))
		.collect();
	(features, labels)
}

#[test]
fn test_train_is_deterministic_and_learns() {
	let (features, labels) = xor_like_dataset(400, 1);
	let options = TrainOptions {
		n_trees: 25,
		max_features: crate::MaxFeatures::All,
		..Default::default()
	};
	let a = BinaryClassifier::train(features.view(), &labels, &options, &mut |_| {}).unwrap();
	let b = BinaryClassifier::train(features.view(), &labels, &options, &mut |_| {}).unwrap();
	assert_eq!(a.trees.len(), 25);
	let (test_features, test_labels) = xor_like_dataset(200, 2);
	let pa = a.predict_probabilities(test_features.view()).unwrap();
	let pb = b.predict_probabilities(test_features.view()).unwrap();
	assert_eq!(pa, pb);
	let n_correct = pa
		.iter()
		.zip(test_labels.iter())
		.filter(|(p, label)| (**p > 0.5) == **label)
		.count();
	assert!(n_correct > 170, "{}", n_correct);
	// The third feature is noise.
	assert!(a.feature_importances[2] < a.feature_importances[0]);
	assert!(a.feature_importances[2] < a.feature_importances[1]);
	let total: f32 = a.feature_importances.iter().sum();
	assert!((total - 1.0).abs() < 1e-4);
}

#[test]
fn test_probabilities_are_in_range() {
	let (features, labels) = xor_like_dataset(100, 3);
	let options = TrainOptions {
		n_trees: 10,
		..Default::default()
	};
	let model = BinaryClassifier::train(features.view(), &labels, &options, &mut |_| {}).unwrap();
	for row in features.axis_iter(Axis(0)) {
		let probability = model.predict_probability(row).unwrap();
		assert!((0.0..=1.0).contains(&probability));
	}
}

#[test]
fn test_single_class_training_set_is_not_certain() {
	let (features, _) = xor_like_dataset(200, 5);
	let labels = vec![true; 200];
	let options = TrainOptions {
		n_trees: 10,
		..Default::default()
	};
	let model = BinaryClassifier::train(features.view(), &labels, &options, &mut |_| {}).unwrap();
	for row in features.axis_iter(Axis(0)) {
		let probability = model.predict_probability(row).unwrap();
		assert!(probability > 0.5 && probability < 1.0, "{}", probability);
	}
}

#[test]
fn test_progress_reports_every_tree() {
	let (features, labels) = xor_like_dataset(50, 4);
	let options = TrainOptions {
		n_trees: 7,
		..Default::default()
	};
	let mut counter = None;
	BinaryClassifier::train(features.view(), &labels, &options, &mut |progress| {
		let TrainProgress::Training(progress_counter) = progress;
		counter = Some(progress_counter);
	})
	.unwrap();
	let counter = counter.unwrap();
	assert_eq!(counter.total(), 7);
	assert!(counter.is_done());
}

#[test]
fn test_train_errors() {
	let features = Array2::<f32>::zeros((0, 3));
	let error = BinaryClassifier::train(features.view(), &[], &TrainOptions::default(), &mut |_| {})
		.unwrap_err();
	assert_eq!(error, TrainError::EmptyTrainingSet);
	let features = Array2::<f32>::zeros((2, 3));
	let error =
		BinaryClassifier::train(features.view(), &[true], &TrainOptions::default(), &mut |_| {})
			.unwrap_err();
	assert_eq!(
		error,
		TrainError::LengthMismatch {
			n_rows: 2,
			n_labels: 1
		}
	);
	let options = TrainOptions {
		n_trees: 0,
		..Default::default()
	};
	let error = BinaryClassifier::train(features.view(), &[true, false], &options, &mut |_| {})
		.unwrap_err();
	assert_eq!(error, TrainError::NoTrees);
}

#[test]
fn test_wrong_feature_count() {
	let features = arr2(&[[0.0, 1.0], [1.0, 0.0]]);
	let model = BinaryClassifier::train(
		features.view(),
		&[false, true],
		&TrainOptions::default(),
		&mut |_| {},
	)
	.unwrap();
	let error = model.predict_probability(arr1(&[1.0]).view()).unwrap_err();
	assert_eq!(
		error,
		PredictError::FeatureCount {
			expected: 2,
			found: 1
		}
	);
}
