use crate::{CategoricalColumn, EncodeError, LabelEncoding, N_FEATURES};
use itertools::izip;
use ndarray::prelude::*;
use seatcast_dataset::BookingFeatureRecord;

/// The label encodings for every categorical column. Once fit, an `EncoderState` is never modified. Changing the codes requires fitting a new state, which in turn requires training a new model.
#[derive(Clone, Debug, PartialEq)]
pub struct EncoderState {
	day_of_week: LabelEncoding,
	route_segment: LabelEncoding,
	seat_type: LabelEncoding,
}

impl EncoderState {
	/// Fit the encodings to the distinct values of each categorical column in `records`.
	pub fn fit<R>(records: &[R]) -> Result<Self, EncodeError>
	where
		R: AsRef<BookingFeatureRecord>,
	{
		if records.is_empty() {
			return Err(EncodeError::EmptyCorpus);
		}
		let fit_column = |column: CategoricalColumn| {
			LabelEncoding::fit(records.iter().map(|record| column.value(record.as_ref())))
		};
		Ok(Self {
			day_of_week: fit_column(CategoricalColumn::DayOfWeek),
			route_segment: fit_column(CategoricalColumn::RouteSegment),
			seat_type: fit_column(CategoricalColumn::SeatType),
		})
	}

	pub fn encoding(&self, column: CategoricalColumn) -> &LabelEncoding {
		match column {
			CategoricalColumn::DayOfWeek => &self.day_of_week,
			CategoricalColumn::RouteSegment => &self.route_segment,
			CategoricalColumn::SeatType => &self.seat_type,
		}
	}

	pub fn encode(&self, column: CategoricalColumn, value: &str) -> Result<usize, EncodeError> {
		self.encoding(column)
			.encode(value)
			.ok_or_else(|| EncodeError::UnknownCategory {
				column: column.name(),
				value: value.to_owned(),
			})
	}

	pub fn decode(&self, column: CategoricalColumn, code: usize) -> Option<&str> {
		self.encoding(column).decode(code)
	}

	/// Encode a single record into a feature row ordered like [`FEATURE_COLUMNS`](constant.FEATURE_COLUMNS.html).
	pub fn transform(&self, record: &BookingFeatureRecord) -> Result<[f32; N_FEATURES], EncodeError> {
		let day_of_week = self.encode(CategoricalColumn::DayOfWeek, record.day_of_week.as_str())?;
		let route_segment = self.encode(CategoricalColumn::RouteSegment, &record.route_segment)?;
		let seat_type = self.encode(CategoricalColumn::SeatType, record.seat_type.as_str())?;
		Ok([
			day_of_week as f32,
			f32::from(record.booking_hour),
			route_segment as f32,
			seat_type as f32,
			f32::from(record.num_seats),
			f32::from(u8::from(record.has_meal)),
			f32::from(record.advance_days),
			f32::from(record.month),
			f32::from(u8::from(record.is_weekend())),
			f32::from(u8::from(record.is_peak_hour())),
		])
	}

	/// Encode many records into a `(n_records, N_FEATURES)` matrix. The first unknown category fails the whole batch.
	pub fn transform_corpus<R>(&self, records: &[R]) -> Result<Array2<f32>, EncodeError>
	where
		R: AsRef<BookingFeatureRecord>,
	{
		let mut features = Array::zeros((records.len(), N_FEATURES));
		for (mut row, record) in izip!(features.axis_iter_mut(Axis(0)), records) {
			let encoded = self.transform(record.as_ref())?;
			row.assign(&ArrayView1::from(&encoded[..]));
		}
		Ok(features)
	}
}

/**
A `FeatureEncoder` owns at most one fitted [`EncoderState`](struct.EncoderState.html). Fitting twice without an explicit `reset` is an error, because a model trained against the first set of codes would silently receive different codes afterwards.
*/
#[derive(Clone, Debug, Default)]
pub struct FeatureEncoder {
	state: Option<EncoderState>,
}

impl FeatureEncoder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn fit<R>(&mut self, records: &[R]) -> Result<&EncoderState, EncodeError>
	where
		R: AsRef<BookingFeatureRecord>,
	{
		if self.state.is_some() {
			return Err(EncodeError::AlreadyFitted);
		}
		let state = EncoderState::fit(records)?;
		Ok(&*self.state.insert(state))
	}

	/// Discard the fitted state, returning it. The encoder can then be fit again.
	pub fn reset(&mut self) -> Option<EncoderState> {
		self.state.take()
	}

	pub fn state(&self) -> Option<&EncoderState> {
		self.state.as_ref()
	}

	pub fn into_state(self) -> Option<EncoderState> {
		self.state
	}

	pub fn transform(&self, record: &BookingFeatureRecord) -> Result<[f32; N_FEATURES], EncodeError> {
		self.state
			.as_ref()
			.ok_or(EncodeError::NotFitted)?
			.transform(record)
	}

	pub fn transform_corpus<R>(&self, records: &[R]) -> Result<Array2<f32>, EncodeError>
	where
		R: AsRef<BookingFeatureRecord>,
	{
		self.state
			.as_ref()
			.ok_or(EncodeError::NotFitted)?
			.transform_corpus(records)
	}
}

#[cfg(test)]
use seatcast_dataset::{DayOfWeek, SeatType};

#[cfg(test)]
fn record(day_of_week: DayOfWeek, route_segment: &str, seat_type: SeatType) -> BookingFeatureRecord {
	BookingFeatureRecord {
		day_of_week,
		booking_hour: 19,
		route_segment: route_segment.to_owned(),
		seat_type,
		num_seats: 3,
		has_meal: true,
		advance_days: 4,
		month: 6,
	}
}

#[test]
fn test_fit_and_transform() {
	let corpus = vec![
		record(DayOfWeek::Sunday, "Surat-Mumbai", SeatType::Upper),
		record(DayOfWeek::Monday, "Ahmedabad-Surat", SeatType::Lower),
		record(DayOfWeek::Monday, "Surat-Mumbai", SeatType::Lower),
	];
	let state = EncoderState::fit(&corpus).unwrap();
	insta::assert_debug_snapshot!(state.encoding(CategoricalColumn::RouteSegment).options(), @r###"
 [
     "Ahmedabad-Surat",
     "Surat-Mumbai",
 ]
 "###);
	let row = state.transform(&corpus[0]).unwrap();
	assert_eq!(row, [1.0, 19.0, 1.0, 1.0, 3.0, 1.0, 4.0, 6.0, 1.0, 1.0]);
	let matrix = state.transform_corpus(&corpus).unwrap();
	assert_eq!(matrix.dim(), (3, N_FEATURES));
	assert_eq!(matrix.row(0).to_vec(), row.to_vec());
	assert_eq!(matrix[[1, 0]], 0.0);
	assert_eq!(matrix[[1, 8]], 0.0);
}

#[test]
fn test_every_fitted_value_decodes_to_itself() {
	let corpus = seatcast_dataset::generate(300, 5);
	let state = EncoderState::fit(&corpus).unwrap();
	for record in corpus.iter() {
		for column in CategoricalColumn::ALL.iter().copied() {
			let value = column.value(&record.features);
			let code = state.encode(column, value).unwrap();
			assert_eq!(state.decode(column, code), Some(value));
		}
	}
}

#[test]
fn test_unknown_category_is_an_error() {
	let corpus = vec![record(DayOfWeek::Friday, "Ahmedabad-Mumbai", SeatType::Lower)];
	let state = EncoderState::fit(&corpus).unwrap();
	let error = state
		.transform(&record(DayOfWeek::Friday, "Delhi-Pune", SeatType::Lower))
		.unwrap_err();
	assert_eq!(
		error,
		EncodeError::UnknownCategory {
			column: "route_segment",
			value: "Delhi-Pune".to_owned(),
		}
	);
	// Valid weekdays that never appeared in the corpus are unknown too.
	let error = state
		.transform(&record(DayOfWeek::Sunday, "Ahmedabad-Mumbai", SeatType::Lower))
		.unwrap_err();
	assert!(matches!(error, EncodeError::UnknownCategory { column: "day_of_week", .. }));
}

#[test]
fn test_fit_twice_requires_reset() {
	let corpus = vec![record(DayOfWeek::Friday, "Ahmedabad-Mumbai", SeatType::Lower)];
	let mut encoder = FeatureEncoder::new();
	assert_eq!(encoder.transform(&corpus[0]).unwrap_err(), EncodeError::NotFitted);
	encoder.fit(&corpus).unwrap();
	let other = vec![record(DayOfWeek::Friday, "Delhi-Pune", SeatType::Upper)];
	assert_eq!(encoder.fit(&other).unwrap_err(), EncodeError::AlreadyFitted);
	// The original codes are untouched by the rejected fit.
	assert!(encoder.transform(&corpus[0]).is_ok());
	assert!(encoder.reset().is_some());
	encoder.fit(&other).unwrap();
	assert!(encoder.transform(&other[0]).is_ok());
	assert!(encoder.transform(&corpus[0]).is_err());
}

#[test]
fn test_empty_corpus() {
	let corpus: Vec<BookingFeatureRecord> = Vec::new();
	assert_eq!(EncoderState::fit(&corpus).unwrap_err(), EncodeError::EmptyCorpus);
}
