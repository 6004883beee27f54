use crate::progress::Progress;
use anyhow::{Context, Result};
use gradecast_dataframe::{DataFrame, FromCsvOptions};
use gradecast_progress::ProgressCounter;
use num_traits::ToPrimitive;
use std::path::Path;

/// Load a csv table from a filesystem path or an http(s) url. A url is fetched whole before parsing; there are no retries, so a failed fetch fails the run.
pub fn load_table(
	source: &str,
	options: FromCsvOptions,
	update_progress: &mut dyn FnMut(Progress),
	make_progress: fn(ProgressCounter) -> Progress,
) -> Result<DataFrame> {
	if source.starts_with("http://") || source.starts_with("https://") {
		let body = reqwest::blocking::get(source)
			.and_then(|response| response.error_for_status())
			.and_then(|response| response.bytes())
			.with_context(|| format!("failed to fetch {}", source))?;
		let progress_counter = ProgressCounter::new(body.len().to_u64().unwrap());
		update_progress(make_progress(progress_counter.clone()));
		let mut reader = csv::Reader::from_reader(std::io::Cursor::new(body));
		DataFrame::from_csv(&mut reader, options, |byte| progress_counter.set(byte))
			.with_context(|| format!("failed to parse csv from {}", source))
	} else {
		let len = std::fs::metadata(source)
			.with_context(|| format!("failed to read {}", source))?
			.len();
		let progress_counter = ProgressCounter::new(len);
		update_progress(make_progress(progress_counter.clone()));
		DataFrame::from_path(Path::new(source), options, |byte| progress_counter.set(byte))
			.with_context(|| format!("failed to parse csv from {}", source))
	}
}
