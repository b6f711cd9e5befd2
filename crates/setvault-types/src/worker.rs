//! Worker pool for CPU-bound jobs (key derivation, encryption) that must not
//! run on the async executor.

use flume::{Receiver, Sender};
use futures::channel::oneshot;
use std::thread;

use crate::prelude::*;

type Job = Box<dyn FnOnce() + Send>;

#[derive(Debug)]
pub struct WorkerPool {
	tx: Sender<Job>,
}

impl WorkerPool {
	/// Start `threads` worker threads (at least one). Threads exit when the
	/// pool is dropped.
	pub fn new(threads: usize) -> Self {
		let (tx, rx) = flume::unbounded::<Job>();

		for n in 0..threads.max(1) {
			let rx = rx.clone();
			let spawned = thread::Builder::new()
				.name(format!("setvault-worker-{}", n))
				.spawn(move || worker_loop(&rx));
			if let Err(err) = spawned {
				error!("Failed to spawn worker thread: {}", err);
			}
		}

		Self { tx }
	}

	/// Submit a closure → returns a Future for the result
	pub fn run<F, T>(&self, f: F) -> impl std::future::Future<Output = SvResult<T>>
	where
		F: FnOnce() -> T + Send + 'static,
		T: Send + 'static,
	{
		let (res_tx, res_rx) = oneshot::channel();

		let job = Box::new(move || {
			let result = f();
			let _ignore = res_tx.send(result);
		});

		if self.tx.send(job).is_err() {
			error!("Failed to send job to worker queue");
		}

		async move {
			res_rx.await.map_err(|_| {
				error!("Worker dropped result channel (task may have panicked)");
				Error::Internal("worker task failed".into())
			})
		}
	}

	/// Like `run`, but flattens `SvResult<SvResult<T>>` into `SvResult<T>`.
	/// Use when the closure itself returns `SvResult<T>`.
	pub fn try_run<F, T>(&self, f: F) -> impl std::future::Future<Output = SvResult<T>>
	where
		F: FnOnce() -> SvResult<T> + Send + 'static,
		T: Send + 'static,
	{
		let fut = self.run(f);
		async move { fut.await? }
	}
}

fn worker_loop(rx: &Receiver<Job>) {
	while let Ok(job) = rx.recv() {
		if let Err(e) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(job)) {
			error!("Worker thread caught panic: {:?}", e);
		}
	}
}


// vim: ts=4
