use num_traits::Float;
use std::cmp::{Ord, Ordering};
use thiserror::Error;

/// A float that is known to be neither NaN nor infinite, and therefore has a total order. This makes it possible to sort feature importances and compare split gains without `partial_cmp(..).unwrap()` scattered around.
#[derive(Clone, Copy, Debug)]
pub struct Finite<T>(T)
where
	T: Float;

#[derive(Debug, Error)]
#[error("not finite")]
pub struct NotFiniteError;

impl<T> Finite<T>
where
	T: Float,
{
	pub fn new(value: T) -> Result<Self, NotFiniteError> {
		if value.is_finite() {
			Ok(Self(value))
		} else {
			Err(NotFiniteError)
		}
	}

	pub fn get(self) -> T {
		self.0
	}
}

impl<T> std::ops::Deref for Finite<T>
where
	T: Float,
{
	type Target = T;
	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

impl<T> std::fmt::Display for Finite<T>
where
	T: Float + std::fmt::Display,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl<T> PartialEq for Finite<T>
where
	T: Float,
{
	#[inline]
	fn eq(&self, other: &Self) -> bool {
		self.0.eq(&other.0)
	}
}

impl<T> Eq for Finite<T> where T: Float {}

impl<T> PartialOrd for Finite<T>
where
	T: Float,
{
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl<T> Ord for Finite<T>
where
	T: Float,
{
	fn cmp(&self, other: &Self) -> Ordering {
		// Neither value can be NaN, so the comparison is total.
		self.0.partial_cmp(&other.0).unwrap_or(Ordering::Equal)
	}
}

pub trait ToFinite<T>
where
	T: Float,
{
	/// If the value is finite, return `Ok(Finite(self))`, otherwise return `Err(NotFiniteError)`.
	fn to_finite(self) -> Result<Finite<T>, NotFiniteError>;
}

impl<T> ToFinite<T> for T
where
	T: Float,
{
	fn to_finite(self) -> Result<Finite<T>, NotFiniteError> {
		Finite::new(self)
	}
}

#[test]
fn test_finite_rejects_nan_and_infinity() {
	assert!(Finite::new(f32::NAN).is_err());
	assert!(Finite::new(f32::INFINITY).is_err());
	assert_eq!(Finite::new(0.25f32).unwrap().get(), 0.25);
}

#[test]
fn test_finite_sorts() {
	let mut values: Vec<Finite<f32>> = [0.3f32, -1.0, 0.7]
		.iter()
		.map(|v| v.to_finite().unwrap())
		.collect();
	values.sort();
	let values: Vec<f32> = values.into_iter().map(|v| v.get()).collect();
	assert_eq!(values, vec![-1.0, 0.3, 0.7]);
}
