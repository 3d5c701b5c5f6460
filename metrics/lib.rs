/*!
This crate evaluates a booking confirmation classifier on a held out partition. Both metrics are accumulated one booking at a time through [`StreamingMetric`](trait.StreamingMetric.html):

| metric | input | output |
|--------|-------|--------|
| [`Accuracy`](struct.Accuracy.html) | `(predicted confirmed, confirmed)` | fraction of bookings labeled correctly |
| [`BinaryCrossEntropy`](struct.BinaryCrossEntropy.html) | confirmation probability and label | mean log loss |

Each returns `None` when it has seen no bookings.
*/

#![allow(clippy::tabs_in_doc_comments)]

mod accuracy;
mod binary_cross_entropy;
mod mean;

pub use self::accuracy::Accuracy;
pub use self::binary_cross_entropy::{BinaryCrossEntropy, BinaryCrossEntropyInput};
pub use self::mean::Mean;

/**
A metric accumulated one booking at a time. Call `update` for every prediction, `merge` to combine partial results computed separately, and `finalize` to read the value.

# Examples

```
use seatcast_metrics::{Accuracy, StreamingMetric};

let mut accuracy = Accuracy::new();
accuracy.update((true, true));
accuracy.update((true, false));
assert_eq!(accuracy.finalize(), Some(0.5));
```
*/
pub trait StreamingMetric<'a> {
	type Input;
	type Output;
	fn update(&mut self, input: Self::Input);
	fn merge(&mut self, other: Self);
	fn finalize(self) -> Self::Output;
}
