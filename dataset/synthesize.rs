use crate::record::{BookingFeatureRecord, DayOfWeek, LabeledBookingRecord, SeatType};
use num_traits::clamp;
use rand::{
	distributions::{Distribution, Uniform, WeightedError, WeightedIndex},
	Rng, SeedableRng,
};
use rand_xoshiro::Xoshiro256Plus;
use thiserror::Error;

/// The station pairs the synthesizer draws route segments from.
pub const ROUTES: [&str; 5] = [
	"Ahmedabad-Vadodara",
	"Ahmedabad-Surat",
	"Ahmedabad-Mumbai",
	"Vadodara-Mumbai",
	"Surat-Mumbai",
];

/// The seat counts `num_seats_weights` assigns weights to, in order.
const NUM_SEATS: [u8; 4] = [1, 2, 3, 4];

/**
These options control how the synthetic corpus is drawn and how each booking's confirmation probability is engineered. The defaults reproduce the reference corpus. The adjustments are demonstration values, not measured business facts, which is why they can be overridden from the config file.

The probability for a booking is

```text
p = base_probability
	+ advance_booking_bonus  if advance_days > advance_days_threshold
	+ weekday_bonus          if not is_weekend
	+ meal_bonus             if has_meal
	+ off_peak_bonus         if not is_peak_hour
	+ single_seat_bonus      if num_seats == 1
	+ uniform(-noise, noise)
```

clipped to `[0, 1]`. The booking is labeled confirmed when `p > 0.5`.
*/
#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct SynthesisOptions {
	pub routes: Vec<String>,
	/// Weights for booking 1, 2, 3, and 4 seats.
	pub num_seats_weights: [f32; 4],
	/// Weights for no meal and meal.
	pub has_meal_weights: [f32; 2],
	pub base_probability: f32,
	pub advance_days_threshold: u8,
	pub advance_booking_bonus: f32,
	pub weekday_bonus: f32,
	pub meal_bonus: f32,
	pub off_peak_bonus: f32,
	pub single_seat_bonus: f32,
	pub noise: f32,
}

impl Default for SynthesisOptions {
	fn default() -> Self {
		Self {
			routes: ROUTES.iter().map(|route| route.to_string()).collect(),
			num_seats_weights: [0.4, 0.3, 0.2, 0.1],
			has_meal_weights: [0.3, 0.7],
			base_probability: 0.5,
			advance_days_threshold: 7,
			advance_booking_bonus: 0.15,
			weekday_bonus: 0.10,
			meal_bonus: 0.12,
			off_peak_bonus: 0.08,
			single_seat_bonus: 0.05,
			noise: 0.15,
		}
	}
}

#[derive(Debug, Error)]
pub enum SynthesisError {
	#[error("at least one route is required")]
	NoRoutes,
	#[error("invalid {name} weights: {source}")]
	InvalidWeights {
		name: &'static str,
		source: WeightedError,
	},
	#[error("noise must be finite and non-negative, got {0}")]
	InvalidNoise(f32),
	#[error("{name} must be finite, got {value}")]
	NotFinite { name: &'static str, value: f32 },
	#[error("route {0:?} is blank")]
	BlankRoute(String),
	#[error("route {0:?} is listed more than once")]
	DuplicateRoute(String),
}

/// A `Synthesizer` draws labeled bookings from the distributions described by its [`SynthesisOptions`](struct.SynthesisOptions.html).
#[derive(Clone, Debug)]
pub struct Synthesizer {
	options: SynthesisOptions,
	num_seats: WeightedIndex<f32>,
	has_meal: WeightedIndex<f32>,
	noise: Uniform<f32>,
}

impl Synthesizer {
	pub fn new(options: SynthesisOptions) -> Result<Self, SynthesisError> {
		if options.routes.is_empty() {
			return Err(SynthesisError::NoRoutes);
		}
		for (index, route) in options.routes.iter().enumerate() {
			if route.trim().is_empty() {
				return Err(SynthesisError::BlankRoute(route.clone()));
			}
			if options.routes[..index].contains(route) {
				return Err(SynthesisError::DuplicateRoute(route.clone()));
			}
		}
		if !options.noise.is_finite() || options.noise < 0.0 {
			return Err(SynthesisError::InvalidNoise(options.noise));
		}
		let adjustments = [
			("base_probability", options.base_probability),
			("advance_booking_bonus", options.advance_booking_bonus),
			("weekday_bonus", options.weekday_bonus),
			("meal_bonus", options.meal_bonus),
			("off_peak_bonus", options.off_peak_bonus),
			("single_seat_bonus", options.single_seat_bonus),
		];
		for (name, value) in adjustments {
			if !value.is_finite() {
				return Err(SynthesisError::NotFinite { name, value });
			}
		}
		let num_seats = WeightedIndex::new(&options.num_seats_weights).map_err(|source| {
			SynthesisError::InvalidWeights {
				name: "num_seats",
				source,
			}
		})?;
		let has_meal = WeightedIndex::new(&options.has_meal_weights).map_err(|source| {
			SynthesisError::InvalidWeights {
				name: "has_meal",
				source,
			}
		})?;
		let noise = Uniform::new_inclusive(-options.noise, options.noise);
		Ok(Self {
			options,
			num_seats,
			has_meal,
			noise,
		})
	}

	pub fn options(&self) -> &SynthesisOptions {
		&self.options
	}

	/// Generate `n` labeled bookings. The same seed always produces the same corpus.
	pub fn generate(&self, n: usize, seed: u64) -> Vec<LabeledBookingRecord> {
		let mut rng = Xoshiro256Plus::seed_from_u64(seed);
		let records: Vec<LabeledBookingRecord> = (0..n)
			.map(|index| {
				let features = self.draw_features(&mut rng);
				let noise = self.noise.sample(&mut rng);
				let confirmation_probability =
					clamp(self.engineered_probability(&features) + noise, 0.0, 1.0);
				LabeledBookingRecord {
					booking_id: LabeledBookingRecord::booking_id_for_index(index),
					features,
					confirmed: confirmation_probability > 0.5,
					confirmation_probability,
				}
			})
			.collect();
		tracing::debug!(
			n_records = records.len(),
			n_confirmed = records.iter().filter(|record| record.confirmed).count(),
			seed,
			"synthesized booking corpus"
		);
		records
	}

	/// The confirmation probability before noise and clipping.
	pub fn engineered_probability(&self, features: &BookingFeatureRecord) -> f32 {
		let options = &self.options;
		let mut probability = options.base_probability;
		if features.advance_days > options.advance_days_threshold {
			probability += options.advance_booking_bonus;
		}
		if !features.is_weekend() {
			probability += options.weekday_bonus;
		}
		if features.has_meal {
			probability += options.meal_bonus;
		}
		if !features.is_peak_hour() {
			probability += options.off_peak_bonus;
		}
		if features.num_seats == 1 {
			probability += options.single_seat_bonus;
		}
		probability
	}

	fn draw_features(&self, rng: &mut Xoshiro256Plus) -> BookingFeatureRecord {
		let day_of_week = DayOfWeek::ALL[rng.gen_range(0..DayOfWeek::ALL.len())];
		let booking_hour = rng.gen_range(0..=23);
		let route_segment = self.options.routes[rng.gen_range(0..self.options.routes.len())].clone();
		let seat_type = SeatType::ALL[rng.gen_range(0..SeatType::ALL.len())];
		let num_seats = NUM_SEATS[self.num_seats.sample(rng)];
		let has_meal = self.has_meal.sample(rng) == 1;
		let advance_days = rng.gen_range(0..=30);
		let month = rng.gen_range(1..=12);
		BookingFeatureRecord {
			day_of_week,
			booking_hour,
			route_segment,
			seat_type,
			num_seats,
			has_meal,
			advance_days,
			month,
		}
	}
}

impl Default for Synthesizer {
	fn default() -> Self {
		Self::new(SynthesisOptions::default()).expect("the default synthesis options are valid")
	}
}

/// Generate `n` labeled bookings with the default synthesis options.
pub fn generate(n: usize, seed: u64) -> Vec<LabeledBookingRecord> {
	Synthesizer::default().generate(n, seed)
}

#[test]
fn test_generate_is_deterministic() {
	assert_eq!(generate(200, 7), generate(200, 7));
	assert_ne!(generate(200, 7), generate(200, 8));
}

#[test]
fn test_generated_records_are_consistent() {
	let records = generate(1000, 42);
	assert_eq!(records.len(), 1000);
	for record in records.iter() {
		assert!((0.0..=1.0).contains(&record.confirmation_probability));
		assert_eq!(record.confirmed, record.confirmation_probability > 0.5);
		assert!(record.features.validate().is_ok());
		assert!(ROUTES.contains(&record.features.route_segment.as_str()));
	}
	assert_eq!(records[0].booking_id, "BK000000");
	assert_eq!(records[999].booking_id, "BK000999");
}

#[test]
fn test_generated_distributions_cover_domains() {
	let records = generate(2000, 3);
	let single_seat = records.iter().filter(|r| r.features.num_seats == 1).count();
	let four_seats = records.iter().filter(|r| r.features.num_seats == 4).count();
	let meals = records.iter().filter(|r| r.features.has_meal).count();
	// 0.4 and 0.1 of 2000, 0.7 of 2000, with generous slack.
	assert!((650..950).contains(&single_seat), "{}", single_seat);
	assert!((120..300).contains(&four_seats), "{}", four_seats);
	assert!(records.iter().all(|r| (1..=4).contains(&r.features.num_seats)));
	assert!((1250..1550).contains(&meals), "{}", meals);
	for day in DayOfWeek::ALL.iter() {
		assert!(records.iter().any(|r| r.features.day_of_week == *day));
	}
	assert!(records.iter().any(|r| r.features.advance_days == 30));
	assert!(records.iter().any(|r| r.features.month == 12));
}

#[test]
fn test_noiseless_probability_matches_adjustments() {
	let synthesizer = Synthesizer::new(SynthesisOptions {
		noise: 0.0,
		..Default::default()
	})
	.unwrap();
	for record in synthesizer.generate(300, 11) {
		let features = &record.features;
		let mut expected = 0.5;
		if features.advance_days > 7 {
			expected += 0.15;
		}
		if !features.is_weekend() {
			expected += 0.10;
		}
		if features.has_meal {
			expected += 0.12;
		}
		if !features.is_peak_hour() {
			expected += 0.08;
		}
		if features.num_seats == 1 {
			expected += 0.05;
		}
		let expected: f32 = clamp(expected, 0.0, 1.0);
		assert!((record.confirmation_probability - expected).abs() < 1e-6);
		assert_eq!(record.confirmed, expected > 0.5);
	}
}

#[test]
fn test_invalid_options_are_rejected() {
	let error = Synthesizer::new(SynthesisOptions {
		routes: Vec::new(),
		..Default::default()
	})
	.unwrap_err();
	assert!(matches!(error, SynthesisError::NoRoutes));
	let error = Synthesizer::new(SynthesisOptions {
		num_seats_weights: [0.0; 4],
		..Default::default()
	})
	.unwrap_err();
	assert!(matches!(
		error,
		SynthesisError::InvalidWeights {
			name: "num_seats",
			..
		}
	));
	let error = Synthesizer::new(SynthesisOptions {
		noise: -0.1,
		..Default::default()
	})
	.unwrap_err();
	assert!(matches!(error, SynthesisError::InvalidNoise(_)));
}

#[test]
fn test_non_finite_adjustments_are_rejected() {
	let error = Synthesizer::new(SynthesisOptions {
		base_probability: f32::NAN,
		..Default::default()
	})
	.unwrap_err();
	assert!(matches!(
		error,
		SynthesisError::NotFinite {
			name: "base_probability",
			..
		}
	));
	let error = Synthesizer::new(SynthesisOptions {
		meal_bonus: f32::INFINITY,
		..Default::default()
	})
	.unwrap_err();
	insta::assert_snapshot!(error.to_string(), @"meal_bonus must be finite, got inf");
}

#[test]
fn test_blank_and_duplicate_routes_are_rejected() {
	let error = Synthesizer::new(SynthesisOptions {
		routes: vec!["Surat-Mumbai".to_owned(), "  ".to_owned()],
		..Default::default()
	})
	.unwrap_err();
	assert!(matches!(error, SynthesisError::BlankRoute(_)));
	let error = Synthesizer::new(SynthesisOptions {
		routes: vec!["Surat-Mumbai".to_owned(), "Surat-Mumbai".to_owned()],
		..Default::default()
	})
	.unwrap_err();
	insta::assert_snapshot!(error.to_string(), @r###"route "Surat-Mumbai" is listed more than once"###);
}
