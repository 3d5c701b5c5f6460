use seatcast_dataset::{DatasetError, InvalidFeatureRangeError, SynthesisError};
use seatcast_features::EncodeError;
use seatcast_tree::{PredictError, TrainError};
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every way the pipeline can refuse to train or to return a probability. Each variant names the field, value, or precondition that was violated.
#[derive(Debug, Error)]
pub enum Error {
	#[error(transparent)]
	InvalidFeatureRange(#[from] InvalidFeatureRangeError),
	/// Includes unknown categories, which callers usually want to report as an unsupported booking.
	#[error(transparent)]
	Encode(#[from] EncodeError),
	#[error("the model has not been trained")]
	UntrainedModel,
	#[error(transparent)]
	Train(#[from] TrainError),
	#[error(transparent)]
	Predict(#[from] PredictError),
	#[error(transparent)]
	Synthesis(#[from] SynthesisError),
	#[error(transparent)]
	Dataset(#[from] DatasetError),
	#[error("invalid configuration: {0}")]
	InvalidConfig(String),
	#[error(transparent)]
	Io(#[from] std::io::Error),
	#[error(transparent)]
	Yaml(#[from] serde_yaml::Error),
	#[error(transparent)]
	Json(#[from] serde_json::Error),
}

impl Error {
	pub fn is_unknown_category(&self) -> bool {
		matches!(self, Error::Encode(EncodeError::UnknownCategory { .. }))
	}
}
