//! A fixed-size worker crew draining a bounded work queue.
//!
//! [`WorkCrew`] parallelizes independent per-item computations (e.g. scoring
//! thousands of candidate rotation axes) across a fixed pool of OS threads.
//! Each worker owns private scratch state, lazily built from a shared factory
//! on its first item and reused for the worker's lifetime, so tight numeric
//! kernels never allocate per item. Work items own their result accumulators,
//! so no shared mutable state is touched on the hot path.
//!
//! Items may complete in any order; callers must not depend on completion
//! order. There is no cancellation or timeout: once enqueued, the batch runs
//! to completion and [`WorkCrew::wait_until_finished`] reports the first
//! failure, if any, after all workers have drained and joined.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{channel, sync_channel, Receiver, Sender, SyncSender};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread::JoinHandle;

use crate::error::{LarmorError, Result};

/// A unit of work processed by a [`WorkCrew`].
pub trait CrewItem: Send + 'static {
    /// Worker-private mutable state, reused across all items a worker handles.
    type Scratch;

    /// Process this item, accumulating results into `self`.
    ///
    /// `scratch` belongs exclusively to the calling worker and retains
    /// whatever state the previous item left in it.
    fn process(&mut self, scratch: &mut Self::Scratch) -> Result<()>;
}

/// Number of workers matching the host's available parallelism.
pub fn available_workers() -> usize {
    std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1)
}

type ItemOutcome<T> = std::result::Result<T, String>;

struct CrewShared {
    progress: OnceLock<Arc<AtomicUsize>>,
}

/// A fixed-size pool of worker threads draining a bounded work queue.
///
/// Lifecycle: [`start`](WorkCrew::start) spawns the workers,
/// [`add_work`](WorkCrew::add_work) enqueues items (blocking while the queue
/// is full), and [`wait_until_finished`](WorkCrew::wait_until_finished)
/// closes the queue, drains every result, joins the workers, and returns the
/// processed items. Dropping a crew without joining detaches its workers;
/// they finish whatever is queued and exit.
pub struct WorkCrew<T: CrewItem> {
    queue: Option<SyncSender<T>>,
    results: Receiver<ItemOutcome<T>>,
    workers: Vec<JoinHandle<()>>,
    shared: Arc<CrewShared>,
    submitted: usize,
}

impl<T: CrewItem> WorkCrew<T> {
    /// Spawn `num_workers` workers behind a queue holding at most
    /// `queue_capacity` pending items.
    ///
    /// `scratch` builds one private scratch value per worker; it runs on the
    /// worker's own thread the first time that worker pulls an item.
    ///
    /// # Errors
    ///
    /// Returns an error if `num_workers` or `queue_capacity` is zero.
    pub fn start<F>(num_workers: usize, queue_capacity: usize, scratch: F) -> Result<Self>
    where
        F: Fn() -> T::Scratch + Send + Sync + 'static,
    {
        if num_workers == 0 {
            return Err(LarmorError::InvalidInput(
                "work crew needs at least one worker".into(),
            ));
        }
        if queue_capacity == 0 {
            return Err(LarmorError::InvalidInput(
                "work queue needs capacity for at least one item".into(),
            ));
        }

        let (queue_tx, queue_rx) = sync_channel::<T>(queue_capacity);
        let queue_rx = Arc::new(Mutex::new(queue_rx));
        let (result_tx, result_rx) = channel::<ItemOutcome<T>>();
        let shared = Arc::new(CrewShared {
            progress: OnceLock::new(),
        });
        let scratch = Arc::new(scratch);

        let mut workers = Vec::with_capacity(num_workers);
        for _ in 0..num_workers {
            let queue_rx = Arc::clone(&queue_rx);
            let result_tx = result_tx.clone();
            let shared = Arc::clone(&shared);
            let scratch = Arc::clone(&scratch);
            workers.push(std::thread::spawn(move || {
                worker_loop(queue_rx, result_tx, shared, scratch);
            }));
        }

        Ok(Self {
            queue: Some(queue_tx),
            results: result_rx,
            workers,
            shared,
            submitted: 0,
        })
    }

    /// Install a shared counter incremented once per completed item.
    ///
    /// Install the counter before enqueuing work; items completed earlier are
    /// not counted retroactively. Only the first installed counter is used.
    pub fn set_progress(&self, counter: Arc<AtomicUsize>) {
        let _ = self.shared.progress.set(counter);
    }

    /// Enqueue one work item, blocking while the queue is full.
    ///
    /// # Errors
    ///
    /// Returns an error if the crew has no live workers left to accept work.
    pub fn add_work(&mut self, item: T) -> Result<()> {
        let queue = self
            .queue
            .as_ref()
            .expect("queue is only closed by wait_until_finished, which consumes the crew");
        queue
            .send(item)
            .map_err(|_| LarmorError::Worker("all workers have exited".into()))?;
        self.submitted += 1;
        Ok(())
    }

    /// Number of items enqueued so far.
    pub fn submitted(&self) -> usize {
        self.submitted
    }

    /// Close the queue, wait for every item to finish, join all workers, and
    /// return the processed items in completion order.
    ///
    /// # Errors
    ///
    /// If any item returned an error or panicked, the whole batch fails with
    /// [`LarmorError::Worker`] carrying the first failure — partial results
    /// are never returned, since a silently dropped item would corrupt
    /// downstream aggregate statistics.
    pub fn wait_until_finished(mut self) -> Result<Vec<T>> {
        // Closing the queue lets workers exit once it drains.
        self.queue = None;

        let mut items = Vec::with_capacity(self.submitted);
        let mut first_error: Option<String> = None;
        for _ in 0..self.submitted {
            match self.results.recv() {
                Ok(Ok(item)) => items.push(item),
                Ok(Err(message)) => {
                    if first_error.is_none() {
                        first_error = Some(message);
                    }
                }
                // All workers gone with results outstanding.
                Err(_) => break,
            }
        }

        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }

        if let Some(message) = first_error {
            return Err(LarmorError::Worker(message));
        }
        if items.len() != self.submitted {
            return Err(LarmorError::Worker(format!(
                "{} of {} work items were lost",
                self.submitted - items.len(),
                self.submitted
            )));
        }
        Ok(items)
    }
}

fn worker_loop<T, F>(
    queue: Arc<Mutex<Receiver<T>>>,
    results: Sender<ItemOutcome<T>>,
    shared: Arc<CrewShared>,
    make_scratch: Arc<F>,
) where
    T: CrewItem,
    F: Fn() -> T::Scratch,
{
    let mut scratch: Option<T::Scratch> = None;
    loop {
        let received = {
            let guard = match queue.lock() {
                Ok(guard) => guard,
                Err(_) => return,
            };
            guard.recv()
        };
        let mut item = match received {
            Ok(item) => item,
            // Queue closed and fully drained.
            Err(_) => return,
        };

        // The scratch factory runs inside the panic guard too: a worker must
        // report an outcome for every item it takes, or the join would hang.
        let outcome = match catch_unwind(AssertUnwindSafe(|| {
            let scratch = scratch.get_or_insert_with(|| make_scratch());
            item.process(scratch)
        })) {
            Ok(Ok(())) => Ok(item),
            Ok(Err(e)) => Err(e.to_string()),
            Err(payload) => Err(panic_message(payload.as_ref())),
        };

        if let Some(counter) = shared.progress.get() {
            counter.fetch_add(1, Ordering::Relaxed);
        }
        if results.send(outcome).is_err() {
            // Crew dropped without joining; nothing left to report to.
            return;
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scores one candidate axis index; the scratch buffer stands in for the
    /// reusable per-worker state a real sampling caller would carry.
    #[derive(Debug)]
    struct AxisItem {
        axis: usize,
        best: Option<f64>,
        fail: bool,
        panic: bool,
    }

    impl AxisItem {
        fn new(axis: usize) -> Self {
            Self {
                axis,
                best: None,
                fail: false,
                panic: false,
            }
        }
    }

    impl CrewItem for AxisItem {
        type Scratch = Vec<f64>;

        fn process(&mut self, scratch: &mut Vec<f64>) -> Result<()> {
            if self.panic {
                panic!("axis {} blew up", self.axis);
            }
            if self.fail {
                return Err(LarmorError::InvalidInput(format!(
                    "axis {} rejected",
                    self.axis
                )));
            }
            scratch.clear();
            for step in 0..16 {
                let angle = (self.axis * 16 + step) as f64 * 0.01;
                scratch.push((angle.sin() * angle.cos()).abs());
            }
            let best = scratch.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            self.best = Some(best);
            Ok(())
        }
    }

    fn run_batch(num_workers: usize, n_items: usize) -> Vec<AxisItem> {
        let mut crew = WorkCrew::start(num_workers, 64, Vec::new).unwrap();
        for axis in 0..n_items {
            crew.add_work(AxisItem::new(axis)).unwrap();
        }
        let mut items = crew.wait_until_finished().unwrap();
        items.sort_by_key(|item| item.axis);
        items
    }

    #[test]
    fn all_items_processed_exactly_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut crew = WorkCrew::start(8, 32, Vec::new).unwrap();
        crew.set_progress(Arc::clone(&counter));
        for axis in 0..1000 {
            crew.add_work(AxisItem::new(axis)).unwrap();
        }
        let mut items = crew.wait_until_finished().unwrap();
        assert_eq!(counter.load(Ordering::Relaxed), 1000);
        assert_eq!(items.len(), 1000);

        items.sort_by_key(|item| item.axis);
        for (expected, item) in items.iter().enumerate() {
            assert_eq!(item.axis, expected, "axis missing or duplicated");
            assert!(item.best.is_some());
        }
    }

    #[test]
    fn results_independent_of_worker_count() {
        let serial = run_batch(1, 200);
        let parallel = run_batch(4, 200);
        for (a, b) in serial.iter().zip(&parallel) {
            assert_eq!(a.axis, b.axis);
            // Bitwise equality: the computation is identical per item.
            assert_eq!(a.best.unwrap().to_bits(), b.best.unwrap().to_bits());
        }
    }

    #[test]
    fn failing_item_fails_the_batch() {
        let mut crew = WorkCrew::start(4, 16, Vec::new).unwrap();
        for axis in 0..50 {
            let mut item = AxisItem::new(axis);
            item.fail = axis == 17;
            crew.add_work(item).unwrap();
        }
        let err = crew.wait_until_finished().unwrap_err();
        assert!(matches!(err, LarmorError::Worker(_)));
        assert!(err.to_string().contains("axis 17"));
    }

    #[test]
    fn panicking_item_fails_the_batch() {
        let mut crew = WorkCrew::start(4, 16, Vec::new).unwrap();
        for axis in 0..20 {
            let mut item = AxisItem::new(axis);
            item.panic = axis == 3;
            crew.add_work(item).unwrap();
        }
        let err = crew.wait_until_finished().unwrap_err();
        assert!(matches!(err, LarmorError::Worker(_)));
        assert!(err.to_string().contains("blew up"));
    }

    #[test]
    fn scratch_built_at_most_once_per_worker() {
        let built = Arc::new(AtomicUsize::new(0));
        let built_in_factory = Arc::clone(&built);
        let mut crew: WorkCrew<AxisItem> = WorkCrew::start(4, 16, move || {
            built_in_factory.fetch_add(1, Ordering::Relaxed);
            Vec::new()
        })
        .unwrap();
        for axis in 0..100 {
            crew.add_work(AxisItem::new(axis)).unwrap();
        }
        crew.wait_until_finished().unwrap();
        let count = built.load(Ordering::Relaxed);
        assert!(count >= 1 && count <= 4, "scratch built {count} times");
    }

    #[test]
    fn zero_workers_rejected() {
        let result: Result<WorkCrew<AxisItem>> = WorkCrew::start(0, 16, Vec::new);
        assert!(matches!(result, Err(LarmorError::InvalidInput(_))));
    }

    #[test]
    fn zero_capacity_rejected() {
        let result: Result<WorkCrew<AxisItem>> = WorkCrew::start(4, 0, Vec::new);
        assert!(matches!(result, Err(LarmorError::InvalidInput(_))));
    }

    #[test]
    fn empty_batch_finishes_immediately() {
        let crew: WorkCrew<AxisItem> = WorkCrew::start(2, 4, Vec::new).unwrap();
        let items = crew.wait_until_finished().unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn available_workers_is_positive() {
        assert!(available_workers() >= 1);
    }
}
