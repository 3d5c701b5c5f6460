use crate::{BranchNode, LeafNode, Node, TrainOptions, Tree};
use ndarray::prelude::*;
use num_traits::ToPrimitive;
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;

/// A single trained tree along with the total impurity decrease attributed to each feature while growing it.
pub struct TrainTreeOutput {
	pub tree: Tree,
	pub impurity_decreases: Vec<f64>,
}

/// A node waiting to be either split or turned into a leaf.
struct QueueItem {
	node_index: usize,
	examples_index: Vec<usize>,
	depth: usize,
}

struct SplitCandidate {
	feature_index: usize,
	split_value: f32,
	/// The sum over both children of `n * gini`, the quantity a split minimizes.
	children_impurity: f64,
}

/**
Train one decision tree with the CART algorithm using gini impurity.

Nodes are grown from a queue rather than recursively, so very deep trees cannot overflow the stack. A node becomes a leaf when it is pure, has fewer than `min_examples_per_split` examples, has reached `max_depth`, or has no valid split among the features sampled for it.
*/
pub fn train_tree(
	features: ArrayView2<f32>,
	labels: &[bool],
	options: &TrainOptions,
	seed: u64,
) -> TrainTreeOutput {
	let mut rng = Xoshiro256Plus::seed_from_u64(seed);
	let n_examples = features.nrows();
	let n_features = features.ncols();
	let max_features = options.max_features.resolve(n_features);

	// Draw the bootstrap resample. Examples drawn more than once are counted once per draw.
	let examples_index: Vec<usize> = if options.bootstrap {
		(0..n_examples)
			.map(|_| rng.gen_range(0..n_examples))
			.collect()
	} else {
		(0..n_examples).collect()
	};
	let n_root_examples = examples_index.len().to_f32().unwrap_or(1.0);

	let mut impurity_decreases = vec![0.0; n_features];
	let mut feature_indexes: Vec<usize> = (0..n_features).collect();
	let placeholder = || {
		Node::Leaf(LeafNode {
			value: 0.0,
			examples_fraction: 0.0,
		})
	};
	let mut nodes = vec![placeholder()];
	let mut queue = vec![QueueItem {
		node_index: 0,
		examples_index,
		depth: 0,
	}];

	while let Some(QueueItem {
		node_index,
		examples_index,
		depth,
	}) = queue.pop()
	{
		let n = examples_index.len();
		let n_positive = examples_index.iter().filter(|i| labels[**i]).count();
		let examples_fraction = n.to_f32().unwrap_or(0.0) / n_root_examples;
		let impurity = weighted_gini(n_positive, n);
		let can_split = n >= options.min_examples_per_split
			&& n >= 2 * options.min_examples_per_leaf
			&& impurity > 0.0
			&& options.max_depth.map(|max| depth < max).unwrap_or(true);
		let split = if can_split {
			feature_indexes.shuffle(&mut rng);
			choose_best_split(
				features,
				labels,
				&examples_index,
				&feature_indexes,
				max_features,
				options.min_examples_per_leaf,
			)
		} else {
			None
		};
		let split = match split {
			Some(split) => split,
			None => {
				nodes[node_index] = Node::Leaf(LeafNode {
					value: leaf_value(n_positive, n),
					examples_fraction,
				});
				continue;
			}
		};
		let (left_examples_index, right_examples_index): (Vec<usize>, Vec<usize>) =
			examples_index
				.iter()
				.copied()
				.partition(|i| features[[*i, split.feature_index]] <= split.split_value);
		impurity_decreases[split.feature_index] += impurity - split.children_impurity;
		let left_child_index = nodes.len();
		nodes.push(placeholder());
		let right_child_index = nodes.len();
		nodes.push(placeholder());
		nodes[node_index] = Node::Branch(BranchNode {
			left_child_index,
			right_child_index,
			feature_index: split.feature_index,
			split_value: split.split_value,
			examples_fraction,
		});
		queue.push(QueueItem {
			node_index: right_child_index,
			examples_index: right_examples_index,
			depth: depth + 1,
		});
		queue.push(QueueItem {
			node_index: left_child_index,
			examples_index: left_examples_index,
			depth: depth + 1,
		});
	}

	TrainTreeOutput {
		tree: Tree { nodes },
		impurity_decreases,
	}
}

/// Find the split with the lowest children impurity among the first `max_features` features in `feature_indexes` that are not constant on this node. Constant features do not count toward `max_features`, so a node is only made a leaf when every feature is constant or no threshold leaves enough examples on both sides.
fn choose_best_split(
	features: ArrayView2<f32>,
	labels: &[bool],
	examples_index: &[usize],
	feature_indexes: &[usize],
	max_features: usize,
	min_examples_per_leaf: usize,
) -> Option<SplitCandidate> {
	let n = examples_index.len();
	let n_positive = examples_index.iter().filter(|i| labels[**i]).count();
	let mut best: Option<SplitCandidate> = None;
	let mut n_features_visited = 0;
	let mut values: Vec<(f32, bool)> = Vec::with_capacity(n);
	for feature_index in feature_indexes.iter().copied() {
		if n_features_visited >= max_features {
			break;
		}
		values.clear();
		values.extend(
			examples_index
				.iter()
				.map(|i| (features[[*i, feature_index]], labels[*i])),
		);
		values.sort_by(|a, b| a.0.total_cmp(&b.0));
		let (first, last) = match (values.first(), values.last()) {
			(Some(first), Some(last)) => (first.0, last.0),
			_ => continue,
		};
		if first == last {
			continue;
		}
		n_features_visited += 1;
		// Sweep the sorted values left to right, considering a threshold between each pair of adjacent distinct values.
		let mut left_n = 0;
		let mut left_n_positive = 0;
		for window in values.windows(2) {
			let (value, label) = window[0];
			let next_value = window[1].0;
			left_n += 1;
			if label {
				left_n_positive += 1;
			}
			if value == next_value {
				continue;
			}
			let right_n = n - left_n;
			if left_n < min_examples_per_leaf || right_n < min_examples_per_leaf {
				continue;
			}
			let children_impurity = weighted_gini(left_n_positive, left_n)
				+ weighted_gini(n_positive - left_n_positive, right_n);
			let is_better = best
				.as_ref()
				.map(|best| children_impurity < best.children_impurity)
				.unwrap_or(true);
			if is_better {
				best = Some(SplitCandidate {
					feature_index,
					split_value: value + (next_value - value) / 2.0,
					children_impurity,
				});
			}
		}
	}
	best
}

/// The Laplace smoothed positive fraction `(n_positive + 1) / (n + 2)`. A pure leaf never claims certainty, so the ensemble probability is always strictly inside `(0, 1)`.
fn leaf_value(n_positive: usize, n: usize) -> f32 {
	let n_positive = n_positive.to_f32().unwrap_or(0.0);
	let n = n.to_f32().unwrap_or(0.0);
	(n_positive + 1.0) / (n + 2.0)
}

/// The gini impurity of a node multiplied by the number of examples in it, `n * (1 - p^2 - (1 - p)^2)`, which simplifies to `2 * n_positive * n_negative / n`.
fn weighted_gini(n_positive: usize, n: usize) -> f64 {
	if n == 0 {
		return 0.0;
	}
	let n_positive = n_positive.to_f64().unwrap_or(0.0);
	let n = n.to_f64().unwrap_or(1.0);
	2.0 * n_positive * (n - n_positive) / n
}

#[test]
fn test_leaf_value() {
	assert_eq!(leaf_value(0, 0), 0.5);
	assert_eq!(leaf_value(3, 3), 0.8);
	assert_eq!(leaf_value(0, 8), 0.1);
	assert!(leaf_value(800, 800) < 1.0);
}

#[test]
fn test_single_class_tree_is_never_certain() {
	let features = Array::from_shape_fn((50, 2), |(i, j)| (i * (j + 1)) as f32);
	let labels = vec![true; 50];
	let output = train_tree(features.view(), &labels, &TrainOptions::default(), 3);
	for row in features.rows() {
		let probability = output.tree.predict(row.as_slice().unwrap());
		assert!(probability > 0.0 && probability < 1.0, "{}", probability);
	}
	let labels = vec![false; 50];
	let output = train_tree(features.view(), &labels, &TrainOptions::default(), 3);
	for row in features.rows() {
		let probability = output.tree.predict(row.as_slice().unwrap());
		assert!(probability > 0.0 && probability < 1.0, "{}", probability);
	}
}

#[test]
fn test_weighted_gini() {
	assert_eq!(weighted_gini(0, 10), 0.0);
	assert_eq!(weighted_gini(10, 10), 0.0);
	assert_eq!(weighted_gini(5, 10), 5.0);
	assert_eq!(weighted_gini(0, 0), 0.0);
}

#[test]
fn test_single_tree_separates_a_threshold() {
	// The label is x0 > 2, x1 is noise.
	let features = arr2(&[
		[0.0, 5.0],
		[1.0, 3.0],
		[2.0, 5.0],
		[3.0, 3.0],
		[4.0, 5.0],
		[5.0, 3.0],
	]);
	let labels = [false, false, false, true, true, true];
	let options = TrainOptions {
		max_features: crate::MaxFeatures::All,
		bootstrap: false,
		..Default::default()
	};
	let TrainTreeOutput {
		tree,
		impurity_decreases,
	} = train_tree(features.view(), &labels, &options, 0);
	insta::assert_debug_snapshot!(tree.nodes[0], @r###"
 Branch(
     BranchNode {
         left_child_index: 1,
         right_child_index: 2,
         feature_index: 0,
         split_value: 2.5,
         examples_fraction: 1.0,
     },
 )
 "###);
	assert_eq!(tree.n_leaves(), 2);
	// Each leaf holds three examples of one class.
	for (row, label) in features.rows().into_iter().zip(labels.iter()) {
		let expected = if *label { 0.8 } else { 0.2 };
		assert_eq!(tree.predict(row.as_slice().unwrap()), expected);
	}
	assert_eq!(impurity_decreases, vec![3.0, 0.0]);
}

#[test]
fn test_constant_features_make_a_leaf() {
	let features = arr2(&[[1.0], [1.0], [1.0], [1.0]]);
	let labels = [true, false, true, true];
	let options = TrainOptions {
		bootstrap: false,
		..Default::default()
	};
	let output = train_tree(features.view(), &labels, &options, 0);
	assert_eq!(output.tree.nodes.len(), 1);
	assert_eq!(output.tree.predict(&[1.0]), 4.0 / 6.0);
}

#[test]
fn test_max_depth_is_respected() {
	let features = Array::from_shape_fn((64, 1), |(i, _)| i as f32);
	let labels: Vec<bool> = (0..64).map(|i| i % 2 == 0).collect();
	let options = TrainOptions {
		max_depth: Some(3),
		bootstrap: false,
		..Default::default()
	};
	let output = train_tree(features.view(), &labels, &options, 0);
	assert!(output.tree.depth() <= 3);
	assert!(output.tree.n_leaves() <= 8);
}

#[test]
fn test_min_examples_per_leaf_is_respected() {
	let features = Array::from_shape_fn((20, 1), |(i, _)| i as f32);
	let labels: Vec<bool> = (0..20).map(|i| i == 0).collect();
	let options = TrainOptions {
		min_examples_per_leaf: 5,
		bootstrap: false,
		..Default::default()
	};
	let output = train_tree(features.view(), &labels, &options, 0);
	let n_examples = 20.0;
	for node in output.tree.nodes.iter() {
		if let Node::Leaf(leaf) = node {
			assert!(leaf.examples_fraction * n_examples >= 5.0 - 1e-4);
		}
	}
}
