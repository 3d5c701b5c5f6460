use std::sync::{
	atomic::{AtomicU64, Ordering},
	Arc,
};

/// A `ProgressCounter` is a cheaply cloneable handle to a shared counter. Training code increments it from worker threads while the caller reads it to report progress.
#[derive(Clone, Debug)]
pub struct ProgressCounter {
	current: Arc<AtomicU64>,
	total: u64,
}

impl ProgressCounter {
	pub fn new(total: u64) -> Self {
		Self {
			current: Arc::new(AtomicU64::new(0)),
			total,
		}
	}
	pub fn total(&self) -> u64 {
		self.total
	}
	pub fn get(&self) -> u64 {
		self.current.load(Ordering::Relaxed)
	}
	pub fn inc(&self, amount: u64) {
		self.current.fetch_add(amount, Ordering::Relaxed);
	}
	pub fn is_done(&self) -> bool {
		self.get() >= self.total
	}
}

#[test]
fn test_progress_counter_is_shared_between_clones() {
	let counter = ProgressCounter::new(3);
	let handle = counter.clone();
	handle.inc(2);
	assert_eq!(counter.get(), 2);
	assert!(!counter.is_done());
	handle.inc(1);
	assert!(counter.is_done());
	assert_eq!(counter.total(), 3);
}
