/*!
This crate defines the [`StreamingMetric`](trait.StreamingMetric.html) trait and the concrete metrics the workflow scores with: [`Mean`](struct.Mean.html), [`MeanSquaredError`](struct.MeanSquaredError.html), and [`MeanVariance`](struct.MeanVariance.html).
*/

#![allow(clippy::tabs_in_doc_comments)]

mod mean;
mod mean_squared_error;
mod mean_variance;

pub use self::mean::Mean;
pub use self::mean_squared_error::MeanSquaredError;
pub use self::mean_variance::{m2_to_variance, merge_mean_m2, MeanVariance};

/**
The `StreamingMetric` trait defines a common interface to metrics that can be computed in a streaming manner, where the input is available in chunks.

After being initialized, a value implementing the `StreamingMetric` trait can have `update()` called on it with values of the associated type `Input`. Multiple values can be merged together by calling `merge()`, which is useful when computing a metric across multiple threads. When finished aggregating, call `finalize()` to produce the associated type `Output`.

The seemingly unused generic lifetime `'a` exists here to allow `Input`s to borrow from their enclosing scope.
*/
pub trait StreamingMetric<'a> {
	type Input;
	type Output;
	fn update(&mut self, input: Self::Input);
	fn merge(&mut self, other: Self);
	fn finalize(self) -> Self::Output;
}
