use super::StreamingMetric;
use num_traits::ToPrimitive;

/// The streaming mean of a sequence of `f32`s. The sum is accumulated as an `f64` so long sequences do not lose precision.
#[derive(Clone, Debug, Default)]
pub struct Mean {
	n: u64,
	sum: f64,
}

impl StreamingMetric<'_> for Mean {
	type Input = f32;
	type Output = Option<f32>;

	fn update(&mut self, input: Self::Input) {
		self.n += 1;
		self.sum += input.to_f64().unwrap();
	}

	fn merge(&mut self, other: Self) {
		self.n += other.n;
		self.sum += other.sum;
	}

	fn finalize(self) -> Self::Output {
		if self.n == 0 {
			None
		} else {
			Some((self.sum / self.n.to_f64().unwrap()).to_f32().unwrap())
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::StreamingMetric;

	#[test]
	fn test_mean() {
		let mut mean = Mean::default();
		for value in &[1.0, 2.0, 3.0, 4.0] {
			mean.update(*value);
		}
		assert_eq!(mean.finalize(), Some(2.5));
	}

	#[test]
	fn test_mean_empty() {
		assert_eq!(Mean::default().finalize(), None);
	}

	#[test]
	fn test_mean_merge() {
		let mut a = Mean::default();
		a.update(1.0);
		a.update(2.0);
		let mut b = Mean::default();
		b.update(3.0);
		a.merge(b);
		assert_eq!(a.finalize(), Some(2.0));
	}
}
