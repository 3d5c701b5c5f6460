/*!
This crate defines the booking records the confirmation model consumes, the synthesizer that produces a labeled training corpus of them, and reading and writing that corpus as csv.
*/

#![allow(clippy::tabs_in_doc_comments)]

mod load;
mod record;
mod synthesize;

pub use self::load::{from_csv, from_path, to_csv, to_path, DatasetError, CSV_COLUMNS};
pub use self::record::{
	BookingFeatureRecord, DayOfWeek, InvalidFeatureRangeError, LabeledBookingRecord,
	RawBookingFeatures, SeatType, PEAK_HOURS,
};
pub use self::synthesize::{generate, SynthesisError, SynthesisOptions, Synthesizer, ROUTES};
