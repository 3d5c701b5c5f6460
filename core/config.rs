/*!
This module defines the `Config` struct, which is used to configure training with [`train`](../fn.train.html). Every field is optional and falls back to the defaults of [`PipelineOptions`](../struct.PipelineOptions.html).

```yaml
n_samples: 1000
seed: 42
test_fraction: 0.2
tree:
  n_trees: 100
  max_features: sqrt
synthesis:
  noise: 0.15
```
*/

use crate::{Error, Result};
use seatcast_dataset::SynthesisOptions;
use std::path::Path;

#[derive(Debug, Default, serde::Deserialize)]
pub struct Config {
	pub n_samples: Option<usize>,
	pub seed: Option<u64>,
	pub test_fraction: Option<f32>,
	pub tree: Option<TreeConfig>,
	pub synthesis: Option<SynthesisOptions>,
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct TreeConfig {
	pub n_trees: Option<usize>,
	pub max_depth: Option<usize>,
	pub min_examples_per_split: Option<usize>,
	pub min_examples_per_leaf: Option<usize>,
	pub max_features: Option<MaxFeaturesConfig>,
	pub bootstrap: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize)]
#[serde(untagged)]
pub enum MaxFeaturesConfig {
	Named(MaxFeaturesName),
	Count(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize)]
pub enum MaxFeaturesName {
	#[serde(rename = "sqrt")]
	Sqrt,
	#[serde(rename = "all")]
	All,
}

impl From<MaxFeaturesConfig> for seatcast_tree::MaxFeatures {
	fn from(value: MaxFeaturesConfig) -> Self {
		match value {
			MaxFeaturesConfig::Named(MaxFeaturesName::Sqrt) => seatcast_tree::MaxFeatures::Sqrt,
			MaxFeaturesConfig::Named(MaxFeaturesName::All) => seatcast_tree::MaxFeatures::All,
			MaxFeaturesConfig::Count(count) => seatcast_tree::MaxFeatures::Count(count),
		}
	}
}

impl Config {
	pub fn from_yaml(yaml: &str) -> Result<Self> {
		Ok(serde_yaml::from_str(yaml)?)
	}

	pub fn from_path(path: &Path) -> Result<Self> {
		let config = std::fs::read_to_string(path)?;
		Self::from_yaml(&config).map_err(|error| {
			Error::InvalidConfig(format!("failed to parse {}: {}", path.display(), error))
		})
	}
}

/// Load the config from the config file, if provided.
pub fn load_config(config_path: Option<&Path>) -> Result<Option<Config>> {
	config_path.map(Config::from_path).transpose()
}

#[test]
fn test_parse_config() {
	let config = Config::from_yaml(
		"
n_samples: 500
test_fraction: 0.25
tree:
  n_trees: 20
  max_features: all
  max_depth: 8
synthesis:
  noise: 0.0
  routes: [A-B, B-C]
",
	)
	.unwrap();
	assert_eq!(config.n_samples, Some(500));
	assert_eq!(config.seed, None);
	let tree = config.tree.unwrap();
	assert_eq!(tree.n_trees, Some(20));
	assert_eq!(
		tree.max_features,
		Some(MaxFeaturesConfig::Named(MaxFeaturesName::All))
	);
	let synthesis = config.synthesis.unwrap();
	assert_eq!(synthesis.noise, 0.0);
	assert_eq!(synthesis.routes, vec!["A-B".to_owned(), "B-C".to_owned()]);
	// Fields left out of the synthesis section keep their defaults.
	assert_eq!(synthesis.meal_bonus, 0.12);
}

#[test]
fn test_max_features_count() {
	let config = Config::from_yaml("tree:\n  max_features: 4\n").unwrap();
	assert_eq!(
		config.tree.unwrap().max_features,
		Some(MaxFeaturesConfig::Count(4))
	);
}

#[test]
fn test_load_config_from_file() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("config.yaml");
	std::fs::write(&path, "seed: 7\n").unwrap();
	let config = load_config(Some(&path)).unwrap().unwrap();
	assert_eq!(config.seed, Some(7));
	assert!(load_config(None).unwrap().is_none());
	std::fs::write(&path, "seed: [not, a, number]\n").unwrap();
	assert!(matches!(
		load_config(Some(&path)),
		Err(Error::InvalidConfig(_))
	));
}
