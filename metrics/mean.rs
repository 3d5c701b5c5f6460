use super::StreamingMetric;
use num_traits::ToPrimitive;

/// The arithmetic mean, accumulated in `f64` to keep long sums stable.
#[derive(Debug, Default, Clone)]
pub struct Mean {
	n: u64,
	sum: f64,
}

impl StreamingMetric<'_> for Mean {
	type Input = f32;
	type Output = Option<f32>;

	fn update(&mut self, value: f32) {
		self.n += 1;
		self.sum += value.to_f64().unwrap_or(0.0);
	}

	fn merge(&mut self, other: Self) {
		self.n += other.n;
		self.sum += other.sum;
	}

	fn finalize(self) -> Option<f32> {
		if self.n == 0 {
			None
		} else {
			(self.sum / self.n.to_f64()?).to_f32()
		}
	}
}

#[test]
fn test_mean() {
	let mut mean = Mean::default();
	for value in &[1.0, 2.0, 6.0] {
		mean.update(*value);
	}
	let mut other = Mean::default();
	other.update(3.0);
	mean.merge(other);
	assert_eq!(mean.finalize(), Some(3.0));
	assert_eq!(Mean::default().finalize(), None);
}
