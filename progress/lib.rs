#![allow(clippy::tabs_in_doc_comments)]

use std::sync::{
	atomic::{AtomicU64, Ordering},
	Arc,
};

/**
A `ProgressCounter` is used to efficiently track the progress of a task occurring across multiple threads, such as training the trees of a forest in parallel.

```ignore
use gradecast_progress::ProgressCounter;

let progress_counter = ProgressCounter::new(n_trees as u64);
trees.par_iter_mut().for_each(|tree| {
	train_tree(tree);
	progress_counter.inc(1);
});
```

It is a thin wrapper around an [atomic](https://doc.rust-lang.org/stable/std/std/sync/atomic/index.html) counter, so incrementing it from many threads does not contend on a lock.
*/
#[derive(Clone, Debug)]
pub struct ProgressCounter {
	current: Arc<AtomicU64>,
	total: u64,
}

impl ProgressCounter {
	/// Create a new `ProgressCounter` that will count from 0 up to the specified `total`.
	pub fn new(total: u64) -> Self {
		Self {
			current: Arc::new(AtomicU64::new(0)),
			total,
		}
	}
	/// Retrieve the total value this `ProgressCounter` counts up to.
	pub fn total(&self) -> u64 {
		self.total
	}
	/// Retrieve the current progress value.
	pub fn get(&self) -> u64 {
		self.current.load(Ordering::Relaxed)
	}
	/// Set the current progress value.
	pub fn set(&self, value: u64) {
		self.current.store(value, Ordering::Relaxed);
	}
	/// Increment the progress value by `amount`.
	pub fn inc(&self, amount: u64) {
		self.current.fetch_add(amount, Ordering::Relaxed);
	}
}
