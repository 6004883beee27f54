use super::{mean::Mean, StreamingMetric};

/// The mean squared error is the mean of the squared differences between the predicted values and the labels. Its square root is the RMSE the grid search ranks by.
#[derive(Clone, Debug, Default)]
pub struct MeanSquaredError(Mean);

impl StreamingMetric<'_> for MeanSquaredError {
	type Input = (f32, f32);
	type Output = Option<f32>;

	fn update(&mut self, value: Self::Input) {
		self.0.update((value.1 - value.0).powi(2))
	}

	fn merge(&mut self, other: Self) {
		self.0.merge(other.0)
	}

	fn finalize(self) -> Self::Output {
		self.0.finalize()
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::StreamingMetric;

	#[test]
	fn test_mean_squared_error() {
		let mut mse = MeanSquaredError::default();
		mse.update((0.0, 1.0));
		mse.update((1.0, 1.0));
		mse.update((0.5, 0.0));
		let value = mse.finalize().unwrap();
		assert!((value - (1.0 + 0.0 + 0.25) / 3.0).abs() < 1e-6);
	}
}
