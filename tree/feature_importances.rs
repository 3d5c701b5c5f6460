use crate::train::TrainTreeOutput;
use num_traits::ToPrimitive;

/**
This function computes feature importances using the mean decrease in impurity. Within each tree, a feature's importance is the total gini impurity decrease of the splits that use it, normalized so the tree's importances sum to one. The ensemble's importances are the average over trees, normalized again. Trees that are a single leaf have no splits to attribute and are left out of the average.
*/
pub fn compute_feature_importances(trees: &[TrainTreeOutput], n_features: usize) -> Vec<f32> {
	let mut feature_importances = vec![0.0f64; n_features];
	let mut n_trees_with_splits = 0;
	for tree in trees.iter() {
		let total: f64 = tree.impurity_decreases.iter().sum();
		if total <= 0.0 {
			continue;
		}
		n_trees_with_splits += 1;
		for (feature_importance, decrease) in
			feature_importances.iter_mut().zip(tree.impurity_decreases.iter())
		{
			*feature_importance += decrease / total;
		}
	}
	if n_trees_with_splits == 0 {
		return vec![0.0; n_features];
	}
	let total: f64 = feature_importances.iter().sum();
	feature_importances
		.into_iter()
		.map(|feature_importance| (feature_importance / total).to_f32().unwrap_or(0.0))
		.collect()
}

#[cfg(test)]
fn output(impurity_decreases: Vec<f64>) -> TrainTreeOutput {
	TrainTreeOutput {
		tree: crate::Tree { nodes: Vec::new() },
		impurity_decreases,
	}
}

#[test]
fn test_compute_feature_importances() {
	let trees = vec![
		output(vec![3.0, 1.0, 0.0]),
		output(vec![0.0, 2.0, 2.0]),
		output(vec![0.0, 0.0, 0.0]),
	];
	let importances = compute_feature_importances(&trees, 3);
	insta::assert_debug_snapshot!(importances, @r###"
 [
     0.375,
     0.375,
     0.25,
 ]
 "###);
}

#[test]
fn test_no_splits_means_no_importance() {
	let trees = vec![output(vec![0.0, 0.0])];
	assert_eq!(compute_feature_importances(&trees, 2), vec![0.0, 0.0]);
}
