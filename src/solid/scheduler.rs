use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::GraphError;
use crate::graph::WallGraph;
use crate::operations::boolean::{BooleanEvaluator, BspEvaluator};
use crate::operations::offset::WallOutline;

use super::{SolidConfig, SolidGenerator, WallSolid};

/// Result of one regeneration request.
#[derive(Debug)]
pub struct RegenerationBatch {
    /// Generation number returned by [`RegenerationScheduler::submit`].
    pub generation: u64,
    pub solids: Result<Vec<WallSolid>, GraphError>,
}

/// Runs solid regeneration off the calling thread.
///
/// Every submission supersedes the previous one. A superseded job stops
/// between walls, and any result it still delivers is dropped by
/// [`collect`](Self::collect), so results are never applied out of order.
pub struct RegenerationScheduler {
    config: SolidConfig,
    evaluator: Arc<dyn BooleanEvaluator>,
    generation: Arc<AtomicU64>,
    sender: Sender<RegenerationBatch>,
    receiver: Receiver<RegenerationBatch>,
}

impl RegenerationScheduler {
    #[must_use]
    pub fn new(config: SolidConfig) -> Self {
        Self::with_evaluator(config, Arc::new(BspEvaluator))
    }

    #[must_use]
    pub fn with_evaluator(config: SolidConfig, evaluator: Arc<dyn BooleanEvaluator>) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            config,
            evaluator,
            generation: Arc::new(AtomicU64::new(0)),
            sender,
            receiver,
        }
    }

    /// The generation of the most recent submission or cancellation.
    #[must_use]
    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Queues regeneration of a graph snapshot on the rayon pool and returns
    /// its generation number.
    pub fn submit(&self, graph: WallGraph) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let latest = Arc::clone(&self.generation);
        let evaluator = Arc::clone(&self.evaluator);
        let sender = self.sender.clone();
        let config = self.config;

        rayon::spawn(move || {
            let generator = SolidGenerator::new(&graph, config).with_evaluator(&*evaluator);
            let superseded = || latest.load(Ordering::SeqCst) != generation;

            let run = |outlines: Vec<WallOutline>| -> Result<Option<Vec<WallSolid>>, GraphError> {
                let mut solids = Vec::with_capacity(outlines.len());
                for outline in &outlines {
                    if superseded() {
                        return Ok(None);
                    }
                    solids.push(generator.generate_wall(outline)?);
                }
                Ok(Some(solids))
            };

            let Some(solids) = generator.outlines().and_then(run).transpose() else {
                debug!(generation, "regeneration superseded");
                return;
            };
            // The receiver only disappears with the scheduler.
            let _ = sender.send(RegenerationBatch { generation, solids });
        });
        debug!(generation, "regeneration submitted");
        generation
    }

    /// Invalidates every outstanding job.
    pub fn cancel(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(generation, "regeneration cancelled");
    }

    /// Returns the finished result of the current generation, if it has
    /// arrived, discarding any stale results.
    pub fn collect(&self) -> Option<RegenerationBatch> {
        let mut latest = None;
        while let Ok(batch) = self.receiver.try_recv() {
            if let Some(batch) = self.keep_current(batch) {
                latest = Some(batch);
            }
        }
        latest
    }

    /// Blocks until the current generation's result arrives or `timeout`
    /// elapses.
    pub fn wait(&self, timeout: Duration) -> Option<RegenerationBatch> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.receiver.recv_timeout(remaining) {
                Ok(batch) => {
                    if let Some(batch) = self.keep_current(batch) {
                        return Some(batch);
                    }
                }
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => return None,
            }
        }
    }

    fn keep_current(&self, batch: RegenerationBatch) -> Option<RegenerationBatch> {
        if batch.generation == self.current_generation() {
            Some(batch)
        } else {
            debug!(
                generation = batch.generation,
                current = self.current_generation(),
                "dropping stale regeneration result"
            );
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::graph::OpeningParams;
    use crate::math::Point2;

    fn graph(walls: usize) -> WallGraph {
        let mut g = WallGraph::new();
        let mut prev = g.add_node(Point2::new(0.0, 0.0)).unwrap();
        for i in 1..=walls {
            let x = 300.0 * i as f64;
            let y = if i % 2 == 0 { 0.0 } else { 100.0 };
            let next = g.add_node(Point2::new(x, y)).unwrap();
            g.add_wall(prev, next, 10.0).unwrap();
            prev = next;
        }
        g
    }

    #[test]
    fn delivers_current_generation() {
        let scheduler = RegenerationScheduler::new(SolidConfig::default());
        let generation = scheduler.submit(graph(3));
        let batch = scheduler.wait(Duration::from_secs(30)).unwrap();
        assert_eq!(batch.generation, generation);
        assert_eq!(batch.solids.unwrap().len(), 3);
    }

    #[test]
    fn superseded_result_is_never_returned() {
        let scheduler = RegenerationScheduler::new(SolidConfig::default());
        let first = scheduler.submit(graph(4));
        let mut with_door = graph(1);
        let wall = with_door.walls().next().unwrap().0;
        with_door
            .add_opening(wall, OpeningParams::door(150.0, 80.0, 200.0))
            .unwrap();
        let second = scheduler.submit(with_door);
        assert!(second > first);

        let batch = scheduler.wait(Duration::from_secs(30)).unwrap();
        assert_eq!(batch.generation, second);
        let solids = batch.solids.unwrap();
        assert_eq!(solids.len(), 1);
        assert_eq!(solids[0].placements.len(), 1);
        assert!(scheduler.collect().is_none());
    }

    #[test]
    fn cancel_discards_outstanding_job() {
        let scheduler = RegenerationScheduler::new(SolidConfig::default());
        scheduler.submit(graph(2));
        scheduler.cancel();
        assert!(scheduler.wait(Duration::from_millis(200)).is_none());
    }
}
