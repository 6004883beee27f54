use gradecast_dataframe::DataFrame;
use num_traits::ToPrimitive;

/// The observable side effect of the completeness filter, reported but never used for control flow.
#[derive(Clone, Copy, Debug)]
pub struct CompletenessReport {
	pub n_rows_before: usize,
	pub n_rows_dropped: usize,
}

impl CompletenessReport {
	pub fn percent_dropped(&self) -> f32 {
		if self.n_rows_before == 0 {
			0.0
		} else {
			100.0 * self.n_rows_dropped.to_f32().unwrap() / self.n_rows_before.to_f32().unwrap()
		}
	}
}

/// Retain only the rows with no missing value in any column. No imputation, no partial retention.
pub fn drop_incomplete_rows(dataframe: &mut DataFrame) -> CompletenessReport {
	let n_rows_before = dataframe.nrows();
	let mask: Vec<bool> = (0..n_rows_before)
		.map(|index| {
			dataframe
				.columns
				.iter()
				.all(|column| !column.is_missing(index))
		})
		.collect();
	dataframe.retain_rows(&mask);
	CompletenessReport {
		n_rows_before,
		n_rows_dropped: n_rows_before - dataframe.nrows(),
	}
}
