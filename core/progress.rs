use gradecast_progress::ProgressCounter;

/// This enum reports the workflow's progress through a callback, one variant per stage.
#[derive(Debug)]
pub enum Progress {
	LoadingTrain(ProgressCounter),
	LoadingTest(ProgressCounter),
	Normalizing,
	FilteringIncomplete,
	TrainingDefault(ProgressCounter),
	GridSearching { current: usize, total: usize },
	RepeatedFitting { current: usize, total: usize },
	Predicting,
}

impl std::fmt::Display for Progress {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Progress::LoadingTrain(_) => write!(f, "loading training table"),
			Progress::LoadingTest(_) => write!(f, "loading test table"),
			Progress::Normalizing => write!(f, "normalizing"),
			Progress::FilteringIncomplete => write!(f, "dropping incomplete rows"),
			Progress::TrainingDefault(counter) => {
				write!(f, "training default model ({} trees)", counter.total())
			}
			Progress::GridSearching { current, total } => {
				write!(f, "grid search {}/{}", current, total)
			}
			Progress::RepeatedFitting { current, total } => {
				write!(f, "repeated fit {}/{}", current, total)
			}
			Progress::Predicting => write!(f, "predicting"),
		}
	}
}
