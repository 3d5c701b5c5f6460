use crate::{FeatureImportance, Result, TrainingReport};
use std::{io::Write, path::Path};

pub const MODEL_TYPE: &str = "Random Forest Classifier";

/// The number of features listed in [`ModelInsights::top_features`](struct.ModelInsights.html#structfield.top_features).
const N_TOP_FEATURES: usize = 5;

/// A summary of a trained pipeline meant for people: accuracies are formatted as percentages and only the most important features are listed.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ModelInsights {
	pub model_type: String,
	pub training_samples: usize,
	pub accuracy_metrics: AccuracyMetrics,
	pub top_features: Vec<FeatureImportance>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AccuracyMetrics {
	pub train_accuracy: String,
	pub test_accuracy: String,
}

impl ModelInsights {
	pub fn from_report(report: &TrainingReport) -> Self {
		Self {
			model_type: MODEL_TYPE.to_owned(),
			training_samples: report.n_samples,
			accuracy_metrics: AccuracyMetrics {
				train_accuracy: format_percent(report.train_accuracy),
				test_accuracy: format_percent(report.test_accuracy),
			},
			top_features: report
				.feature_importance
				.iter()
				.take(N_TOP_FEATURES)
				.cloned()
				.collect(),
		}
	}

	/// Write the insights as pretty printed JSON.
	pub fn to_writer<W: Write>(&self, mut writer: W) -> Result<()> {
		serde_json::to_writer_pretty(&mut writer, self)?;
		writer.flush()?;
		Ok(())
	}

	pub fn to_path(&self, path: &Path) -> Result<()> {
		let file = std::fs::File::create(path)?;
		self.to_writer(std::io::BufWriter::new(file))
	}

	pub fn from_path(path: &Path) -> Result<Self> {
		let file = std::fs::File::open(path)?;
		Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
	}
}

fn format_percent(value: f32) -> String {
	format!("{:.2}%", value * 100.0)
}

#[cfg(test)]
fn report() -> TrainingReport {
	let feature_importance = [
		("advance_days", 0.3),
		("booking_hour", 0.2),
		("has_meal", 0.15),
		("num_seats", 0.12),
		("day_of_week_encoded", 0.1),
		("month", 0.08),
		("route_segment_encoded", 0.05),
	]
	.iter()
	.map(|(feature, importance)| FeatureImportance {
		feature: feature.to_string(),
		importance: *importance,
	})
	.collect();
	TrainingReport {
		n_samples: 1000,
		n_train: 800,
		n_test: 200,
		train_accuracy: 0.99,
		test_accuracy: 0.745,
		test_log_loss: 0.52,
		feature_importance,
	}
}

#[test]
fn test_insights_from_report() {
	let insights = ModelInsights::from_report(&report());
	assert_eq!(insights.model_type, "Random Forest Classifier");
	assert_eq!(insights.training_samples, 1000);
	assert_eq!(insights.accuracy_metrics.test_accuracy, "74.50%");
	assert_eq!(insights.top_features.len(), 5);
	assert_eq!(insights.top_features[0].feature, "advance_days");
	assert_eq!(insights.top_features[4].feature, "day_of_week_encoded");
}

#[test]
fn test_insights_json_round_trip() {
	let insights = ModelInsights::from_report(&report());
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("model_insights.json");
	insights.to_path(&path).unwrap();
	let json = std::fs::read_to_string(&path).unwrap();
	assert!(json.contains("\"model_type\": \"Random Forest Classifier\""));
	assert!(json.contains("\"train_accuracy\": \"99.00%\""));
	assert_eq!(ModelInsights::from_path(&path).unwrap(), insights);
}

#[cfg(test)]
struct UnflushableWriter(Vec<u8>);

#[cfg(test)]
impl Write for UnflushableWriter {
	fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
		self.0.extend_from_slice(buf);
		Ok(buf.len())
	}
	fn flush(&mut self) -> std::io::Result<()> {
		Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
	}
}

#[test]
fn test_insights_write_reports_flush_errors() {
	let insights = ModelInsights::from_report(&report());
	let result = insights.to_writer(std::io::BufWriter::new(UnflushableWriter(Vec::new())));
	assert!(matches!(result, Err(crate::Error::Io(_))));
}
