use fnv::FnvHashMap;

/**
A `LabelEncoding` maps each distinct value of one categorical column to an integer code. The codes are the positions of the values after sorting, so fitting on the same set of values always yields the same codes regardless of the order they were seen in.

# Example

For a `seat_type` column with the values `["upper", "lower", "upper"]`:

| value    | code     |
|----------|----------|
| "lower"  | Some(0)  |
| "upper"  | Some(1)  |
| "middle" | None     |
*/
#[derive(Clone, Debug)]
pub struct LabelEncoding {
	options: Vec<String>,
	codes: FnvHashMap<String, usize>,
}

impl LabelEncoding {
	pub fn fit<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
		let mut options: Vec<String> = values.into_iter().map(|value| value.to_owned()).collect();
		options.sort_unstable();
		options.dedup();
		let codes = options
			.iter()
			.enumerate()
			.map(|(code, option)| (option.clone(), code))
			.collect();
		Self { options, codes }
	}

	pub fn encode(&self, value: &str) -> Option<usize> {
		self.codes.get(value).copied()
	}

	pub fn decode(&self, code: usize) -> Option<&str> {
		self.options.get(code).map(|option| option.as_str())
	}

	/// The distinct values seen at fit time, in code order.
	pub fn options(&self) -> &[String] {
		&self.options
	}

	pub fn len(&self) -> usize {
		self.options.len()
	}

	pub fn is_empty(&self) -> bool {
		self.options.is_empty()
	}
}

impl PartialEq for LabelEncoding {
	fn eq(&self, other: &Self) -> bool {
		self.options == other.options
	}
}

#[test]
fn test_codes_are_sorted_and_stable() {
	let a = LabelEncoding::fit(vec!["upper", "lower", "upper"]);
	let b = LabelEncoding::fit(vec!["lower", "upper"]);
	assert_eq!(a, b);
	assert_eq!(a.encode("lower"), Some(0));
	assert_eq!(a.encode("upper"), Some(1));
	assert_eq!(a.encode("middle"), None);
	assert_eq!(a.decode(1), Some("upper"));
	assert_eq!(a.decode(2), None);
	assert_eq!(a.len(), 2);
}
