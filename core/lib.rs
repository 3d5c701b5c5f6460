/*!
This crate ties the booking confirmation pipeline together. [`train`](fn.train.html) synthesizes a corpus, fits the feature encoder, trains the tree ensemble on a seeded training partition and evaluates it on the held out partition. The resulting [`TrainedPipeline`](struct.TrainedPipeline.html) is an immutable value that answers [`predict`](fn.predict.html) calls, and a [`Predictor`](struct.Predictor.html) holds the current pipeline for callers that retrain while serving predictions.
*/

#![allow(clippy::tabs_in_doc_comments)]

mod config;
mod error;
mod predict;
mod progress;
mod report;
mod test;
mod train;

pub use self::config::{load_config, Config, MaxFeaturesConfig, MaxFeaturesName, TreeConfig};
pub use self::error::{Error, Result};
pub use self::predict::{predict, ConfirmationOutlook, Predictor};
pub use self::progress::Progress;
pub use self::report::{AccuracyMetrics, ModelInsights, MODEL_TYPE};
pub use self::test::{split_train_test, TrainTestSplit};
pub use self::train::{
	train, train_from_scratch, FeatureImportance, PipelineOptions, TrainedPipeline,
	TrainingReport,
};

pub use seatcast_dataset::{BookingFeatureRecord, RawBookingFeatures};
pub use seatcast_features::EncodeError;
