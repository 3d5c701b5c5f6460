/*!
This crate implements a binary classifier that is a bagged ensemble of decision trees, also known as a random forest. Each tree is trained on a bootstrap resample of the training examples, considering a random subset of the features at each split, and the ensemble's probability for an example is the average of its trees' leaf probabilities.

The trees are trained in parallel. Every tree gets its own seed drawn up front from the ensemble seed, so the trained model does not depend on how the work was scheduled.
*/

#![allow(clippy::tabs_in_doc_comments)]

mod binary_classifier;
mod feature_importances;
mod train;

pub use self::binary_classifier::BinaryClassifier;

use seatcast_util::progress_counter::ProgressCounter;
use thiserror::Error;

/// These are the options passed to `BinaryClassifier::train`.
#[derive(Clone, Debug, PartialEq)]
pub struct TrainOptions {
	/// The number of trees in the ensemble.
	pub n_trees: usize,
	/// The depth of a single tree will never exceed this value. If it is `None`, trees are grown until their leaves are pure or too small to split.
	pub max_depth: Option<usize>,
	/// A node will only be split if at least this many training examples reach it.
	pub min_examples_per_split: usize,
	/// A split will only be considered valid if the number of training examples sent to each of the resulting children is at least this value.
	pub min_examples_per_leaf: usize,
	/// The number of features considered when choosing each split.
	pub max_features: MaxFeatures,
	/// If true, each tree is trained on a bootstrap resample of the training examples. If false, every tree sees every example and only the feature subsampling differs between trees.
	pub bootstrap: bool,
	/// The seed the per tree seeds are drawn from.
	pub seed: u64,
}

impl Default for TrainOptions {
	fn default() -> Self {
		Self {
			n_trees: 100,
			max_depth: None,
			min_examples_per_split: 2,
			min_examples_per_leaf: 1,
			max_features: MaxFeatures::Sqrt,
			bootstrap: true,
			seed: 42,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MaxFeatures {
	/// The square root of the number of features, rounded down.
	Sqrt,
	All,
	Count(usize),
}

impl MaxFeatures {
	pub fn resolve(self, n_features: usize) -> usize {
		let n = match self {
			MaxFeatures::Sqrt => (n_features as f64).sqrt().floor() as usize,
			MaxFeatures::All => n_features,
			MaxFeatures::Count(count) => count,
		};
		n.clamp(1, n_features.max(1))
	}
}

/// This enum reports the training progress.
#[derive(Debug)]
pub enum TrainProgress {
	/// The counter is incremented once for every tree that finishes training.
	Training(ProgressCounter),
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum TrainError {
	#[error("cannot train on an empty training set")]
	EmptyTrainingSet,
	#[error("there are {n_rows} feature rows but {n_labels} labels")]
	LengthMismatch { n_rows: usize, n_labels: usize },
	#[error("the ensemble must have at least one tree")]
	NoTrees,
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum PredictError {
	#[error("expected {expected} features but got {found}")]
	FeatureCount { expected: usize, found: usize },
}

/// Trees are stored as a `Vec` of `Node`s. Each branch in the tree has two indexes into the `Vec`, one for each of its children. The root is always at index 0.
#[derive(Clone, Debug)]
pub struct Tree {
	pub nodes: Vec<Node>,
}

impl Tree {
	/// Return the probability of the positive class stored in the leaf the example reaches.
	pub fn predict(&self, features: &[f32]) -> f32 {
		// Start at the root node.
		let mut node_index = 0;
		// Traverse the tree until we get to a leaf.
		loop {
			match &self.nodes[node_index] {
				Node::Branch(BranchNode {
					left_child_index,
					right_child_index,
					feature_index,
					split_value,
					..
				}) => {
					node_index = if features[*feature_index] <= *split_value {
						*left_child_index
					} else {
						*right_child_index
					};
				}
				Node::Leaf(LeafNode { value, .. }) => return *value,
			}
		}
	}

	pub fn n_leaves(&self) -> usize {
		self.nodes
			.iter()
			.filter(|node| matches!(node, Node::Leaf(_)))
			.count()
	}

	/// The number of branches on the longest path from the root to a leaf.
	pub fn depth(&self) -> usize {
		let mut max_depth = 0;
		let mut stack = vec![(0, 0)];
		while let Some((node_index, depth)) = stack.pop() {
			match &self.nodes[node_index] {
				Node::Leaf(_) => max_depth = max_depth.max(depth),
				Node::Branch(branch) => {
					stack.push((branch.left_child_index, depth + 1));
					stack.push((branch.right_child_index, depth + 1));
				}
			}
		}
		max_depth
	}
}

/// A node is either a branch or a leaf.
#[derive(Clone, Debug)]
pub enum Node {
	Branch(BranchNode),
	Leaf(LeafNode),
}

impl Node {
	pub fn examples_fraction(&self) -> f32 {
		match self {
			Self::Leaf(LeafNode {
				examples_fraction, ..
			}) => *examples_fraction,
			Self::Branch(BranchNode {
				examples_fraction, ..
			}) => *examples_fraction,
		}
	}
}

/// A `BranchNode` sends an example to its left child if the value of the feature at `feature_index` is <= `split_value`, and to its right child otherwise.
#[derive(Clone, Debug)]
pub struct BranchNode {
	pub left_child_index: usize,
	pub right_child_index: usize,
	pub feature_index: usize,
	/// The midpoint between two adjacent distinct feature values seen in training.
	pub split_value: f32,
	/// The fraction of the tree's training examples that passed through this node.
	pub examples_fraction: f32,
}

/// The leaves in a tree hold the Laplace smoothed fraction of their training examples that were positive, `(n_positive + 1) / (n + 2)`.
#[derive(Clone, Debug)]
pub struct LeafNode {
	pub value: f32,
	pub examples_fraction: f32,
}

#[test]
fn test_max_features() {
	assert_eq!(MaxFeatures::Sqrt.resolve(10), 3);
	assert_eq!(MaxFeatures::Sqrt.resolve(1), 1);
	assert_eq!(MaxFeatures::All.resolve(10), 10);
	assert_eq!(MaxFeatures::Count(0).resolve(10), 1);
	assert_eq!(MaxFeatures::Count(50).resolve(10), 10);
}

#[test]
fn test_tree_predict() {
	// x0 <= 1.5 ? 0.25 : (x1 <= 0.5 ? 0.0 : 1.0)
	let tree = Tree {
		nodes: vec![
			Node::Branch(BranchNode {
				left_child_index: 1,
				right_child_index: 2,
				feature_index: 0,
				split_value: 1.5,
				examples_fraction: 1.0,
			}),
			Node::Leaf(LeafNode {
				value: 0.25,
				examples_fraction: 0.5,
			}),
			Node::Branch(BranchNode {
				left_child_index: 3,
				right_child_index: 4,
				feature_index: 1,
				split_value: 0.5,
				examples_fraction: 0.5,
			}),
			Node::Leaf(LeafNode {
				value: 0.0,
				examples_fraction: 0.25,
			}),
			Node::Leaf(LeafNode {
				value: 1.0,
				examples_fraction: 0.25,
			}),
		],
	};
	assert_eq!(tree.predict(&[1.0, 9.0]), 0.25);
	assert_eq!(tree.predict(&[2.0, 0.0]), 0.0);
	assert_eq!(tree.predict(&[2.0, 1.0]), 1.0);
	assert_eq!(tree.n_leaves(), 3);
	assert_eq!(tree.depth(), 2);
	assert_eq!(Tree { nodes: vec![tree.nodes[1].clone()] }.depth(), 0);
	assert_eq!(tree.nodes[2].examples_fraction(), 0.5);
}
