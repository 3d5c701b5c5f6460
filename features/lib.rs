/*!
This crate turns booking records into the numeric feature rows the classifier consumes. The three categorical columns are label encoded with codes learned once from the training corpus, and the numeric and derived columns are passed through.
*/

#![allow(clippy::tabs_in_doc_comments)]

mod encoder;
mod label_encoding;

pub use self::encoder::{EncoderState, FeatureEncoder};
pub use self::label_encoding::LabelEncoding;

use thiserror::Error;

/// The number of columns in an encoded feature row.
pub const N_FEATURES: usize = 10;

/// The names of the columns in an encoded feature row, in order.
pub const FEATURE_COLUMNS: [&str; N_FEATURES] = [
	"day_of_week_encoded",
	"booking_hour",
	"route_segment_encoded",
	"seat_type_encoded",
	"num_seats",
	"has_meal",
	"advance_days",
	"month",
	"is_weekend",
	"is_peak_hour",
];

/// The columns that are label encoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CategoricalColumn {
	DayOfWeek,
	RouteSegment,
	SeatType,
}

impl CategoricalColumn {
	pub const ALL: [CategoricalColumn; 3] = [
		CategoricalColumn::DayOfWeek,
		CategoricalColumn::RouteSegment,
		CategoricalColumn::SeatType,
	];

	pub fn name(self) -> &'static str {
		match self {
			CategoricalColumn::DayOfWeek => "day_of_week",
			CategoricalColumn::RouteSegment => "route_segment",
			CategoricalColumn::SeatType => "seat_type",
		}
	}

	pub fn value(self, record: &seatcast_dataset::BookingFeatureRecord) -> &str {
		match self {
			CategoricalColumn::DayOfWeek => record.day_of_week.as_str(),
			CategoricalColumn::RouteSegment => record.route_segment.as_str(),
			CategoricalColumn::SeatType => record.seat_type.as_str(),
		}
	}
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum EncodeError {
	/// The value was never seen when the encoder was fit. Assigning it some other code would silently change what the trained model sees, so this is always an error.
	#[error("unknown category {value:?} for {column}")]
	UnknownCategory { column: &'static str, value: String },
	#[error("the encoder is already fit, reset it before fitting again")]
	AlreadyFitted,
	#[error("the encoder has not been fit")]
	NotFitted,
	#[error("cannot fit the encoder on an empty corpus")]
	EmptyCorpus,
}
