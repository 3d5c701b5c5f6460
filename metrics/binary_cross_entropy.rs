use super::{mean::Mean, StreamingMetric};
use num_traits::clamp;

/// BinaryCrossEntropy is the log loss of predicted confirmation probabilities. [Learn more](https://en.wikipedia.org/wiki/Cross_entropy#Cross-entropy_loss_function_and_logistic_regression).
#[derive(Debug, Default)]
pub struct BinaryCrossEntropy(Mean);

/// The input to [BinaryCrossEntropy](struct.BinaryCrossEntropy.html).
pub struct BinaryCrossEntropyInput {
	pub probability: f32,
	pub label: bool,
}

impl StreamingMetric<'_> for BinaryCrossEntropy {
	type Input = BinaryCrossEntropyInput;
	type Output = Option<f32>;

	fn update(&mut self, value: BinaryCrossEntropyInput) {
		let BinaryCrossEntropyInput { probability, label } = value;
		let label = if label { 1.0 } else { 0.0 };
		// Binary cross entropy is undefined when the probability is exactly 0 or 1.
		let probability_clamped = clamp(probability, f32::EPSILON, 1.0 - f32::EPSILON);
		let binary_cross_entropy = -1.0 * label * probability_clamped.ln()
			+ -1.0 * (1.0 - label) * (1.0 - probability_clamped).ln();
		self.0.update(binary_cross_entropy);
	}

	fn merge(&mut self, other: Self) {
		self.0.merge(other.0)
	}

	fn finalize(self) -> Option<f32> {
		self.0.finalize()
	}
}

#[test]
fn test_binary_cross_entropy() {
	let mut metric = BinaryCrossEntropy::default();
	metric.update(BinaryCrossEntropyInput {
		probability: 0.5,
		label: true,
	});
	metric.update(BinaryCrossEntropyInput {
		probability: 0.5,
		label: false,
	});
	let loss = metric.finalize().unwrap();
	assert!((loss - std::f32::consts::LN_2).abs() < 1e-6);
}

#[test]
fn test_binary_cross_entropy_confident_and_wrong_is_finite() {
	let mut metric = BinaryCrossEntropy::default();
	metric.update(BinaryCrossEntropyInput {
		probability: 0.0,
		label: true,
	});
	assert!(metric.finalize().unwrap().is_finite());
}
