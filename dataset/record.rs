use std::{fmt, str::FromStr};
use thiserror::Error;

/// Booking hours that count as peak traffic.
pub const PEAK_HOURS: [u8; 6] = [9, 10, 11, 18, 19, 20];

/// A field of a booking was outside its declared domain. Inference inputs are never clamped, so this is returned instead of a probability.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("invalid value {value:?} for {field}, expected {domain}")]
pub struct InvalidFeatureRangeError {
	pub field: &'static str,
	pub value: String,
	pub domain: &'static str,
}

impl InvalidFeatureRangeError {
	pub(crate) fn new(field: &'static str, value: impl ToString, domain: &'static str) -> Self {
		Self {
			field,
			value: value.to_string(),
			domain,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DayOfWeek {
	Monday,
	Tuesday,
	Wednesday,
	Thursday,
	Friday,
	Saturday,
	Sunday,
}

impl DayOfWeek {
	pub const ALL: [DayOfWeek; 7] = [
		DayOfWeek::Monday,
		DayOfWeek::Tuesday,
		DayOfWeek::Wednesday,
		DayOfWeek::Thursday,
		DayOfWeek::Friday,
		DayOfWeek::Saturday,
		DayOfWeek::Sunday,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			DayOfWeek::Monday => "Monday",
			DayOfWeek::Tuesday => "Tuesday",
			DayOfWeek::Wednesday => "Wednesday",
			DayOfWeek::Thursday => "Thursday",
			DayOfWeek::Friday => "Friday",
			DayOfWeek::Saturday => "Saturday",
			DayOfWeek::Sunday => "Sunday",
		}
	}

	pub fn is_weekend(self) -> bool {
		matches!(self, DayOfWeek::Saturday | DayOfWeek::Sunday)
	}
}

impl fmt::Display for DayOfWeek {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for DayOfWeek {
	type Err = InvalidFeatureRangeError;
	fn from_str(value: &str) -> Result<Self, Self::Err> {
		DayOfWeek::ALL
			.iter()
			.copied()
			.find(|day| day.as_str() == value)
			.ok_or_else(|| {
				InvalidFeatureRangeError::new("day_of_week", value, "Monday through Sunday")
			})
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SeatType {
	Lower,
	Upper,
}

impl SeatType {
	pub const ALL: [SeatType; 2] = [SeatType::Lower, SeatType::Upper];

	pub fn as_str(self) -> &'static str {
		match self {
			SeatType::Lower => "lower",
			SeatType::Upper => "upper",
		}
	}
}

impl fmt::Display for SeatType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for SeatType {
	type Err = InvalidFeatureRangeError;
	fn from_str(value: &str) -> Result<Self, Self::Err> {
		match value {
			"lower" => Ok(SeatType::Lower),
			"upper" => Ok(SeatType::Upper),
			_ => Err(InvalidFeatureRangeError::new(
				"seat_type",
				value,
				"lower or upper",
			)),
		}
	}
}

/**
The booking fields as they arrive at the inference boundary, before any validation. Convert to a [`BookingFeatureRecord`](struct.BookingFeatureRecord.html) with `TryFrom` to check every field against its domain.

```
use seatcast_dataset::{BookingFeatureRecord, RawBookingFeatures};

let raw: RawBookingFeatures = serde_json::from_str(r#"{
	"day_of_week": "Friday",
	"booking_hour": 14,
	"route_segment": "Ahmedabad-Mumbai",
	"seat_type": "lower",
	"num_seats": 2,
	"has_meal": 1,
	"advance_days": 10,
	"month": 3
}"#).unwrap();
let record = BookingFeatureRecord::try_from(&raw).unwrap();
assert!(!record.is_weekend());
assert!(!record.is_peak_hour());
```
*/
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RawBookingFeatures {
	pub day_of_week: String,
	pub booking_hour: i64,
	pub route_segment: String,
	pub seat_type: String,
	pub num_seats: i64,
	pub has_meal: i64,
	pub advance_days: i64,
	pub month: i64,
}

/// One booking's validated predictive inputs. The calendar flags `is_weekend` and `is_peak_hour` are always derived, never stored.
#[derive(Clone, Debug, PartialEq)]
pub struct BookingFeatureRecord {
	pub day_of_week: DayOfWeek,
	pub booking_hour: u8,
	pub route_segment: String,
	pub seat_type: SeatType,
	pub num_seats: u8,
	pub has_meal: bool,
	pub advance_days: u8,
	pub month: u8,
}

impl BookingFeatureRecord {
	pub fn is_weekend(&self) -> bool {
		self.day_of_week.is_weekend()
	}

	pub fn is_peak_hour(&self) -> bool {
		PEAK_HOURS.contains(&self.booking_hour)
	}

	/// The fields are public, so a record built by hand may still be out of range. Check it before deriving anything from it.
	pub fn validate(&self) -> Result<(), InvalidFeatureRangeError> {
		check_range("booking_hour", self.booking_hour.into(), 0, 23, "0 to 23")?;
		check_range("num_seats", self.num_seats.into(), 1, 4, "1 to 4")?;
		check_range("advance_days", self.advance_days.into(), 0, 30, "0 to 30")?;
		check_range("month", self.month.into(), 1, 12, "1 to 12")?;
		check_route_segment(&self.route_segment)?;
		Ok(())
	}
}

impl TryFrom<&RawBookingFeatures> for BookingFeatureRecord {
	type Error = InvalidFeatureRangeError;
	fn try_from(raw: &RawBookingFeatures) -> Result<Self, Self::Error> {
		let day_of_week = raw.day_of_week.parse()?;
		let booking_hour = check_range("booking_hour", raw.booking_hour, 0, 23, "0 to 23")?;
		check_route_segment(&raw.route_segment)?;
		let seat_type = raw.seat_type.parse()?;
		let num_seats = check_range("num_seats", raw.num_seats, 1, 4, "1 to 4")?;
		let has_meal = check_range("has_meal", raw.has_meal, 0, 1, "0 or 1")? == 1;
		let advance_days = check_range("advance_days", raw.advance_days, 0, 30, "0 to 30")?;
		let month = check_range("month", raw.month, 1, 12, "1 to 12")?;
		Ok(BookingFeatureRecord {
			day_of_week,
			booking_hour,
			route_segment: raw.route_segment.clone(),
			seat_type,
			num_seats,
			has_meal,
			advance_days,
			month,
		})
	}
}

impl From<&BookingFeatureRecord> for RawBookingFeatures {
	fn from(record: &BookingFeatureRecord) -> Self {
		RawBookingFeatures {
			day_of_week: record.day_of_week.as_str().to_owned(),
			booking_hour: record.booking_hour.into(),
			route_segment: record.route_segment.clone(),
			seat_type: record.seat_type.as_str().to_owned(),
			num_seats: record.num_seats.into(),
			has_meal: record.has_meal.into(),
			advance_days: record.advance_days.into(),
			month: record.month.into(),
		}
	}
}

/// A synthesized training example: the features, the sampled label, and the probability the label was sampled from.
#[derive(Clone, Debug, PartialEq)]
pub struct LabeledBookingRecord {
	pub booking_id: String,
	pub features: BookingFeatureRecord,
	pub confirmed: bool,
	pub confirmation_probability: f32,
}

impl AsRef<BookingFeatureRecord> for BookingFeatureRecord {
	fn as_ref(&self) -> &BookingFeatureRecord {
		self
	}
}

impl AsRef<BookingFeatureRecord> for LabeledBookingRecord {
	fn as_ref(&self) -> &BookingFeatureRecord {
		&self.features
	}
}

impl LabeledBookingRecord {
	pub fn booking_id_for_index(index: usize) -> String {
		format!("BK{:06}", index)
	}
}

fn check_range(
	field: &'static str,
	value: i64,
	min: i64,
	max: i64,
	domain: &'static str,
) -> Result<u8, InvalidFeatureRangeError> {
	if value < min || value > max {
		return Err(InvalidFeatureRangeError::new(field, value, domain));
	}
	u8::try_from(value).map_err(|_| InvalidFeatureRangeError::new(field, value, domain))
}

fn check_route_segment(route_segment: &str) -> Result<(), InvalidFeatureRangeError> {
	if route_segment.trim().is_empty() {
		return Err(InvalidFeatureRangeError::new(
			"route_segment",
			route_segment,
			"a non-empty station pair",
		));
	}
	Ok(())
}

#[cfg(test)]
fn friday() -> RawBookingFeatures {
	RawBookingFeatures {
		day_of_week: "Friday".to_owned(),
		booking_hour: 14,
		route_segment: "Ahmedabad-Mumbai".to_owned(),
		seat_type: "lower".to_owned(),
		num_seats: 2,
		has_meal: 1,
		advance_days: 10,
		month: 3,
	}
}

#[test]
fn test_derived_flags() {
	for day in DayOfWeek::ALL.iter() {
		let expected = day.as_str() == "Saturday" || day.as_str() == "Sunday";
		assert_eq!(day.is_weekend(), expected, "{}", day);
	}
	let mut record = BookingFeatureRecord::try_from(&friday()).unwrap();
	for hour in 0..24u8 {
		record.booking_hour = hour;
		let expected = matches!(hour, 9 | 10 | 11 | 18 | 19 | 20);
		assert_eq!(record.is_peak_hour(), expected, "hour {}", hour);
	}
}

#[test]
fn test_try_from_raw() {
	let record = BookingFeatureRecord::try_from(&friday()).unwrap();
	assert_eq!(record.day_of_week, DayOfWeek::Friday);
	assert_eq!(record.seat_type, SeatType::Lower);
	assert!(record.has_meal);
	assert!(!record.is_weekend());
	assert!(!record.is_peak_hour());
	assert_eq!(RawBookingFeatures::from(&record), friday());
}

#[test]
fn test_out_of_range_fields_are_rejected() {
	let cases: Vec<(&str, Box<dyn Fn(&mut RawBookingFeatures)>)> = vec![
		("booking_hour", Box::new(|raw| raw.booking_hour = 24)),
		("booking_hour", Box::new(|raw| raw.booking_hour = -1)),
		("num_seats", Box::new(|raw| raw.num_seats = 0)),
		("num_seats", Box::new(|raw| raw.num_seats = 5)),
		("has_meal", Box::new(|raw| raw.has_meal = 2)),
		("advance_days", Box::new(|raw| raw.advance_days = 31)),
		("month", Box::new(|raw| raw.month = 0)),
		("month", Box::new(|raw| raw.month = 13)),
		("day_of_week", Box::new(|raw| raw.day_of_week = "Funday".to_owned())),
		("seat_type", Box::new(|raw| raw.seat_type = "middle".to_owned())),
		("route_segment", Box::new(|raw| raw.route_segment = " ".to_owned())),
	];
	for (field, mutate) in cases {
		let mut raw = friday();
		mutate(&mut raw);
		let error = BookingFeatureRecord::try_from(&raw).unwrap_err();
		assert_eq!(error.field, field);
	}
}

#[test]
fn test_validate_hand_built_record() {
	let mut record = BookingFeatureRecord::try_from(&friday()).unwrap();
	assert!(record.validate().is_ok());
	record.num_seats = 9;
	let error = record.validate().unwrap_err();
	insta::assert_snapshot!(error.to_string(), @r###"invalid value "9" for num_seats, expected 1 to 4"###);
}

#[test]
fn test_booking_id_for_index() {
	assert_eq!(LabeledBookingRecord::booking_id_for_index(7), "BK000007");
}
