use crate::record::{
	BookingFeatureRecord, InvalidFeatureRangeError, LabeledBookingRecord, RawBookingFeatures,
};
use std::{
	io::{Read, Write},
	path::Path,
};
use thiserror::Error;

/// The columns of a persisted corpus, in order.
pub const CSV_COLUMNS: [&str; 13] = [
	"booking_id",
	"day_of_week",
	"booking_hour",
	"route_segment",
	"seat_type",
	"num_seats",
	"has_meal",
	"advance_days",
	"month",
	"is_weekend",
	"is_peak_hour",
	"confirmed",
	"confirmation_probability",
];

#[derive(Debug, Error)]
pub enum DatasetError {
	#[error(transparent)]
	Csv(#[from] csv::Error),
	#[error(transparent)]
	Io(#[from] std::io::Error),
	#[error("expected the columns {expected:?} but found {found:?}")]
	UnexpectedHeader {
		expected: Vec<String>,
		found: Vec<String>,
	},
	#[error("row {row}: {source}")]
	InvalidRecord {
		row: usize,
		source: InvalidFeatureRangeError,
	},
	#[error("row {row}: {column} is stored as {stored} but derives to {derived}")]
	DerivedMismatch {
		row: usize,
		column: &'static str,
		stored: u8,
		derived: u8,
	},
	#[error("row {row}: confirmed is stored as {confirmed} but the confirmation probability is {probability}")]
	LabelMismatch {
		row: usize,
		confirmed: u8,
		probability: f32,
	},
}

/// One csv row. Booleans are written as 0 and 1 so the file reads the same as the reference corpus.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct CsvRow {
	booking_id: String,
	day_of_week: String,
	booking_hour: i64,
	route_segment: String,
	seat_type: String,
	num_seats: i64,
	has_meal: i64,
	advance_days: i64,
	month: i64,
	is_weekend: u8,
	is_peak_hour: u8,
	confirmed: u8,
	confirmation_probability: f32,
}

impl From<&LabeledBookingRecord> for CsvRow {
	fn from(record: &LabeledBookingRecord) -> Self {
		let features = &record.features;
		let raw = RawBookingFeatures::from(features);
		CsvRow {
			booking_id: record.booking_id.clone(),
			day_of_week: raw.day_of_week,
			booking_hour: raw.booking_hour,
			route_segment: raw.route_segment,
			seat_type: raw.seat_type,
			num_seats: raw.num_seats,
			has_meal: raw.has_meal,
			advance_days: raw.advance_days,
			month: raw.month,
			is_weekend: features.is_weekend().into(),
			is_peak_hour: features.is_peak_hour().into(),
			confirmed: record.confirmed.into(),
			confirmation_probability: record.confirmation_probability,
		}
	}
}

impl CsvRow {
	fn into_record(self, row: usize) -> Result<LabeledBookingRecord, DatasetError> {
		let invalid = |source| DatasetError::InvalidRecord { row, source };
		let raw = RawBookingFeatures {
			day_of_week: self.day_of_week,
			booking_hour: self.booking_hour,
			route_segment: self.route_segment,
			seat_type: self.seat_type,
			num_seats: self.num_seats,
			has_meal: self.has_meal,
			advance_days: self.advance_days,
			month: self.month,
		};
		let features = BookingFeatureRecord::try_from(&raw).map_err(invalid)?;
		check_derived(row, "is_weekend", self.is_weekend, features.is_weekend())?;
		check_derived(row, "is_peak_hour", self.is_peak_hour, features.is_peak_hour())?;
		if self.confirmed > 1 {
			return Err(invalid(InvalidFeatureRangeError::new(
				"confirmed",
				self.confirmed,
				"0 or 1",
			)));
		}
		if !(0.0..=1.0).contains(&self.confirmation_probability) {
			return Err(invalid(InvalidFeatureRangeError::new(
				"confirmation_probability",
				self.confirmation_probability,
				"0 to 1",
			)));
		}
		if (self.confirmed == 1) != (self.confirmation_probability > 0.5) {
			return Err(DatasetError::LabelMismatch {
				row,
				confirmed: self.confirmed,
				probability: self.confirmation_probability,
			});
		}
		Ok(LabeledBookingRecord {
			booking_id: self.booking_id,
			features,
			confirmed: self.confirmed == 1,
			confirmation_probability: self.confirmation_probability,
		})
	}
}

fn check_derived(
	row: usize,
	column: &'static str,
	stored: u8,
	derived: bool,
) -> Result<(), DatasetError> {
	let derived = u8::from(derived);
	if stored != derived {
		return Err(DatasetError::DerivedMismatch {
			row,
			column,
			stored,
			derived,
		});
	}
	Ok(())
}

/// Write the corpus as csv with a header row.
pub fn to_csv<W: Write>(writer: W, records: &[LabeledBookingRecord]) -> Result<(), DatasetError> {
	let mut writer = csv::Writer::from_writer(writer);
	for record in records {
		writer.serialize(CsvRow::from(record))?;
	}
	writer.flush()?;
	Ok(())
}

pub fn to_path(path: &Path, records: &[LabeledBookingRecord]) -> Result<(), DatasetError> {
	let file = std::fs::File::create(path)?;
	to_csv(file, records)?;
	tracing::info!(path = %path.display(), n_records = records.len(), "wrote booking corpus");
	Ok(())
}

/// Read a corpus written by [`to_csv`](fn.to_csv.html). Every row is validated the same way inference inputs are, and the stored calendar flags must agree with the ones derived from the row.
pub fn from_csv<R: Read>(reader: R) -> Result<Vec<LabeledBookingRecord>, DatasetError> {
	let mut reader = csv::Reader::from_reader(reader);
	let found: Vec<String> = reader.headers()?.iter().map(|h| h.to_owned()).collect();
	if found.iter().map(|h| h.as_str()).ne(CSV_COLUMNS.iter().copied()) {
		return Err(DatasetError::UnexpectedHeader {
			expected: CSV_COLUMNS.iter().map(|c| c.to_string()).collect(),
			found,
		});
	}
	reader
		.deserialize::<CsvRow>()
		.enumerate()
		.map(|(row, csv_row)| csv_row?.into_record(row))
		.collect()
}

pub fn from_path(path: &Path) -> Result<Vec<LabeledBookingRecord>, DatasetError> {
	let file = std::fs::File::open(path)?;
	from_csv(file)
}

#[test]
fn test_header_is_exact() {
	let records = crate::synthesize::generate(2, 1);
	let mut buffer = Vec::new();
	to_csv(&mut buffer, &records).unwrap();
	let text = String::from_utf8(buffer).unwrap();
	let header = text.lines().next().unwrap();
	assert_eq!(header, CSV_COLUMNS.join(","));
}

#[test]
fn test_round_trip_through_a_file() {
	let records = crate::synthesize::generate(50, 9);
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("mock_booking_dataset.csv");
	to_path(&path, &records).unwrap();
	let loaded = from_path(&path).unwrap();
	assert_eq!(loaded, records);
}

#[test]
fn test_row_is_written_as_integers() {
	let csv = "booking_id,day_of_week,booking_hour,route_segment,seat_type,num_seats,has_meal,advance_days,month,is_weekend,is_peak_hour,confirmed,confirmation_probability\n\
		BK000000,Sunday,22,Ahmedabad-Surat,upper,1,0,1,12,1,0,0,0.42\n";
	let records = from_csv(csv.as_bytes()).unwrap();
	let mut buffer = Vec::new();
	to_csv(&mut buffer, &records).unwrap();
	assert_eq!(String::from_utf8(buffer).unwrap(), csv);
}

#[test]
fn test_mismatched_derived_flag_is_rejected() {
	let csv = "booking_id,day_of_week,booking_hour,route_segment,seat_type,num_seats,has_meal,advance_days,month,is_weekend,is_peak_hour,confirmed,confirmation_probability\n\
		BK000000,Sunday,22,Ahmedabad-Surat,upper,1,0,1,12,0,0,0,0.42\n";
	let error = from_csv(csv.as_bytes()).unwrap_err();
	insta::assert_snapshot!(error.to_string(), @"row 0: is_weekend is stored as 0 but derives to 1");
}

#[test]
fn test_out_of_range_row_is_rejected() {
	let csv = "booking_id,day_of_week,booking_hour,route_segment,seat_type,num_seats,has_meal,advance_days,month,is_weekend,is_peak_hour,confirmed,confirmation_probability\n\
		BK000000,Friday,14,Ahmedabad-Mumbai,lower,7,1,10,3,0,0,1,0.9\n";
	let error = from_csv(csv.as_bytes()).unwrap_err();
	assert!(matches!(
		error,
		DatasetError::InvalidRecord { row: 0, ref source } if source.field == "num_seats"
	));
}

#[test]
fn test_unexpected_header_is_rejected() {
	let csv = "booking_id,day_of_week\nBK000000,Friday\n";
	let error = from_csv(csv.as_bytes()).unwrap_err();
	assert!(matches!(error, DatasetError::UnexpectedHeader { .. }));
}

#[test]
fn test_label_disagreeing_with_probability_is_rejected() {
	let csv = "booking_id,day_of_week,booking_hour,route_segment,seat_type,num_seats,has_meal,advance_days,month,is_weekend,is_peak_hour,confirmed,confirmation_probability\n\
		BK000000,Sunday,22,Ahmedabad-Surat,upper,1,0,1,12,1,0,1,0.5\n";
	let error = from_csv(csv.as_bytes()).unwrap_err();
	insta::assert_snapshot!(error.to_string(), @"row 0: confirmed is stored as 1 but the confirmation probability is 0.5");
}
