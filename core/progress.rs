use seatcast_util::progress_counter::ProgressCounter;

/// The phases of [`train`](fn.train.html), reported in order through its `update_progress` callback.
#[derive(Debug)]
pub enum Progress {
	Synthesizing { n_samples: usize },
	FittingEncoder,
	/// The counter advances once per finished tree.
	Training(ProgressCounter),
	Testing { n_test: usize },
}
