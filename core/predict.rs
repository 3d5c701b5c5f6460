use crate::{train, Error, PipelineOptions, Progress, Result, TrainedPipeline};
use parking_lot::RwLock;
use seatcast_dataset::{BookingFeatureRecord, RawBookingFeatures};
use std::{fmt, sync::Arc};

/// Return the confirmation probability of `booking` as a percentage in `[0, 100]`, rounded to two decimal places. The derived weekend and peak hour flags are computed here and never read from the caller.
pub fn predict(pipeline: &TrainedPipeline, booking: &RawBookingFeatures) -> Result<f64> {
	let record = BookingFeatureRecord::try_from(booking)?;
	let probability = pipeline.predict_probability(&record)?;
	Ok(to_percentage(probability))
}

fn to_percentage(probability: f32) -> f64 {
	let percentage = (f64::from(probability) * 100.0 * 100.0).round() / 100.0;
	percentage.clamp(0.0, 100.0)
}

/**
A `Predictor` holds the current [`TrainedPipeline`](struct.TrainedPipeline.html), if any. Predictions take a snapshot of the pipeline, so a retrain that finishes while predictions are running only affects the predictions that start after it.

| State     | `predict` returns                                   |
|-----------|-----------------------------------------------------|
| untrained | [`Error::UntrainedModel`](enum.Error.html)          |
| trained   | the probability from the most recent pipeline       |
*/
#[derive(Debug, Default)]
pub struct Predictor {
	pipeline: RwLock<Option<Arc<TrainedPipeline>>>,
}

impl Predictor {
	pub fn new() -> Self {
		Self::default()
	}

	/// Train a new pipeline and make it current. The lock is not held while training, and the previous pipeline keeps serving until the new one is ready.
	pub fn train(
		&self,
		options: &PipelineOptions,
		update_progress: &mut dyn FnMut(Progress),
	) -> Result<Arc<TrainedPipeline>> {
		let pipeline = Arc::new(train(options, update_progress)?);
		self.replace(pipeline.clone());
		Ok(pipeline)
	}

	pub fn train_from_scratch(&self, n_samples: usize, seed: u64) -> Result<Arc<TrainedPipeline>> {
		let options = PipelineOptions {
			n_samples,
			seed,
			..Default::default()
		};
		self.train(&options, &mut |_| {})
	}

	/// Make `pipeline` current, returning the pipeline it replaces.
	pub fn replace(&self, pipeline: Arc<TrainedPipeline>) -> Option<Arc<TrainedPipeline>> {
		self.pipeline.write().replace(pipeline)
	}

	/// Return to the untrained state.
	pub fn reset(&self) -> Option<Arc<TrainedPipeline>> {
		self.pipeline.write().take()
	}

	pub fn pipeline(&self) -> Option<Arc<TrainedPipeline>> {
		self.pipeline.read().clone()
	}

	pub fn is_trained(&self) -> bool {
		self.pipeline.read().is_some()
	}

	pub fn predict(&self, booking: &RawBookingFeatures) -> Result<f64> {
		let pipeline = self.pipeline().ok_or(Error::UntrainedModel)?;
		predict(&pipeline, booking)
	}
}

/// How likely a booking is to be confirmed, bucketed for display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfirmationOutlook {
	/// At least 75%.
	High,
	/// At least 50%.
	Moderate,
	AtRisk,
}

impl ConfirmationOutlook {
	pub fn from_percentage(percentage: f64) -> Self {
		if percentage >= 75.0 {
			ConfirmationOutlook::High
		} else if percentage >= 50.0 {
			ConfirmationOutlook::Moderate
		} else {
			ConfirmationOutlook::AtRisk
		}
	}
}

impl fmt::Display for ConfirmationOutlook {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let description = match self {
			ConfirmationOutlook::High => "very high chance of confirmation",
			ConfirmationOutlook::Moderate => "moderate chance of confirmation",
			ConfirmationOutlook::AtRisk => "low chance of confirmation",
		};
		write!(f, "{}", description)
	}
}

#[cfg(test)]
fn booking(
	day_of_week: &str,
	booking_hour: i64,
	route_segment: &str,
	seat_type: &str,
	num_seats: i64,
	has_meal: i64,
	advance_days: i64,
	month: i64,
) -> RawBookingFeatures {
	RawBookingFeatures {
		day_of_week: day_of_week.to_owned(),
		booking_hour,
		route_segment: route_segment.to_owned(),
		seat_type: seat_type.to_owned(),
		num_seats,
		has_meal,
		advance_days,
		month,
	}
}

#[test]
fn test_end_to_end_predictions() {
	let pipeline = crate::train_from_scratch(1000, 42).unwrap();
	let report = &pipeline.report;
	assert_eq!(report.n_samples, 1000);
	assert_eq!(report.n_test, 200);
	assert!((0.0..=1.0).contains(&report.train_accuracy));
	assert!((0.0..=1.0).contains(&report.test_accuracy));

	let friday = booking("Friday", 14, "Ahmedabad-Mumbai", "lower", 2, 1, 10, 3);
	let record = BookingFeatureRecord::try_from(&friday).unwrap();
	assert!(!record.is_weekend());
	assert!(!record.is_peak_hour());
	let probability = predict(&pipeline, &friday).unwrap();
	assert!(probability > 0.0 && probability < 100.0, "{}", probability);
	assert!(probability > 50.0);
	assert_eq!((probability * 100.0).round() / 100.0, probability);

	let sunday = booking("Sunday", 22, "Ahmedabad-Surat", "upper", 1, 0, 1, 12);
	let record = BookingFeatureRecord::try_from(&sunday).unwrap();
	assert!(record.is_weekend());
	assert!(!record.is_peak_hour());
	let probability = predict(&pipeline, &sunday).unwrap();
	assert!((0.0..=100.0).contains(&probability));

	let delhi = booking("Friday", 14, "Delhi-Pune", "lower", 2, 1, 10, 3);
	let error = predict(&pipeline, &delhi).unwrap_err();
	assert!(error.is_unknown_category());
	insta::assert_snapshot!(error.to_string(), @r###"unknown category "Delhi-Pune" for route_segment"###);
}

#[test]
fn test_out_of_range_features_are_rejected() {
	let pipeline = crate::train_from_scratch(200, 1).unwrap();
	let cases = [
		booking("Funday", 14, "Ahmedabad-Mumbai", "lower", 2, 1, 10, 3),
		booking("Friday", 24, "Ahmedabad-Mumbai", "lower", 2, 1, 10, 3),
		booking("Friday", 14, "Ahmedabad-Mumbai", "middle", 2, 1, 10, 3),
		booking("Friday", 14, "Ahmedabad-Mumbai", "lower", 5, 1, 10, 3),
		booking("Friday", 14, "Ahmedabad-Mumbai", "lower", 2, 2, 10, 3),
		booking("Friday", 14, "Ahmedabad-Mumbai", "lower", 2, 1, -1, 3),
		booking("Friday", 14, "Ahmedabad-Mumbai", "lower", 2, 1, 10, 13),
	];
	for case in cases.iter() {
		assert!(matches!(
			predict(&pipeline, case),
			Err(Error::InvalidFeatureRange(_))
		));
	}
}

#[test]
fn test_predictor_lifecycle() {
	let predictor = Predictor::new();
	let sunday = booking("Sunday", 22, "Ahmedabad-Surat", "upper", 1, 0, 1, 12);
	assert!(matches!(
		predictor.predict(&sunday),
		Err(Error::UntrainedModel)
	));
	predictor.train_from_scratch(200, 3).unwrap();
	assert!(predictor.is_trained());
	let first = predictor.predict(&sunday).unwrap();
	assert_eq!(predictor.predict(&sunday).unwrap(), first);
	let snapshot = predictor.pipeline().unwrap();
	predictor.train_from_scratch(200, 4).unwrap();
	assert!(!Arc::ptr_eq(&snapshot, &predictor.pipeline().unwrap()));
	assert_eq!(predict(&snapshot, &sunday).unwrap(), first);
	predictor.reset();
	assert!(matches!(
		predictor.predict(&sunday),
		Err(Error::UntrainedModel)
	));
}

#[test]
fn test_confirmation_outlook() {
	assert_eq!(ConfirmationOutlook::from_percentage(75.0), ConfirmationOutlook::High);
	assert_eq!(ConfirmationOutlook::from_percentage(74.99), ConfirmationOutlook::Moderate);
	assert_eq!(ConfirmationOutlook::from_percentage(50.0), ConfirmationOutlook::Moderate);
	assert_eq!(ConfirmationOutlook::from_percentage(12.5), ConfirmationOutlook::AtRisk);
	assert_eq!(
		ConfirmationOutlook::High.to_string(),
		"very high chance of confirmation"
	);
}

#[test]
fn test_to_percentage_rounds_to_two_places() {
	assert_eq!(to_percentage(0.0), 0.0);
	assert_eq!(to_percentage(1.0), 100.0);
	assert_eq!(to_percentage(0.5), 50.0);
	let percentage = to_percentage(0.123456);
	assert!((percentage - 12.35).abs() < 1e-9);
}
