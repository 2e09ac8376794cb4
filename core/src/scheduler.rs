//! Bounded fan-out of probes.
//!
//! Targets are admitted in enumeration order through a semaphore. A permit is
//! taken **before** the probe task is spawned, so at most `limit` probes exist
//! at any moment and targets that have not been admitted cost nothing beyond
//! their place in the iterator. Outcomes are delivered in completion order
//! through an [`OutcomeStream`] bounded to `limit` buffered outcomes. A probe
//! keeps its permit until its outcome is queued, so a slow consumer stalls
//! admission instead of letting outcomes pile up.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, warn};

use crate::probe::{ProbeOutcome, Prober};

/// Receiving end of a scheduled run. Ends once every admitted probe reported.
pub struct OutcomeStream<T> {
    rx: mpsc::Receiver<ProbeOutcome<T>>,
}

impl<T> OutcomeStream<T> {
    pub async fn next(&mut self) -> Option<ProbeOutcome<T>> {
        self.rx.recv().await
    }
}

/// Runs probes with a hard ceiling on how many are in flight.
#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    limit: usize,
}

impl Scheduler {
    /// A limit of zero would never admit anything and is raised to one.
    pub fn new(concurrency_limit: usize) -> Self {
        Self {
            limit: concurrency_limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Starts probing `targets` in the background and returns their outcomes.
    ///
    /// Must be called from within a Tokio runtime. Dropping the returned stream
    /// stops admission of further targets; probes already running finish on
    /// their own timeout.
    pub fn run<P, I>(&self, prober: Arc<P>, targets: I, timeout: Duration) -> OutcomeStream<P::Target>
    where
        P: Prober,
        I: IntoIterator<Item = P::Target>,
        I::IntoIter: Send + 'static,
    {
        let (tx, rx) = mpsc::channel(self.limit);
        let gate = Arc::new(Semaphore::new(self.limit));

        tokio::spawn(dispatch(prober, targets.into_iter(), gate, tx, timeout));

        OutcomeStream { rx }
    }
}

async fn dispatch<P, I>(
    prober: Arc<P>,
    targets: I,
    gate: Arc<Semaphore>,
    tx: mpsc::Sender<ProbeOutcome<P::Target>>,
    timeout: Duration,
) where
    P: Prober,
    I: Iterator<Item = P::Target>,
{
    let mut admitted: usize = 0;

    for target in targets {
        if tx.is_closed() {
            debug!(admitted, "Outcome receiver dropped, stopping admission");
            break;
        }

        let permit = match gate.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(e) => {
                warn!("Could not admit probe for {target:?}: {e}");
                let _ = tx
                    .send(ProbeOutcome::unreachable(target, format!("scheduling error: {e}")))
                    .await;
                continue;
            }
        };
        admitted += 1;

        let prober = Arc::clone(&prober);
        let tx = tx.clone();

        tokio::spawn(async move {
            // The probe runs in its own task so a panic becomes a JoinError
            // for this target instead of a lost outcome.
            let probe = tokio::spawn(async move { prober.probe(target, timeout).await });

            let outcome = match probe.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("Probe for {target:?} aborted: {e}");
                    ProbeOutcome::unreachable(target, format!("scheduling error: {e}"))
                }
            };

            let _ = tx.send(outcome).await;
            drop(permit);
        });
    }

    debug!(admitted, "All targets admitted");
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Sleeps a little per target and records the peak number of concurrent probes.
    #[derive(Default)]
    struct GaugeProber {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Prober for GaugeProber {
        type Target = u32;

        async fn probe(&self, target: u32, _timeout: Duration) -> ProbeOutcome<u32> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);

            // Uneven delays so completion order differs from admission order.
            let delay = 1 + (target % 5) as u64;
            tokio::time::sleep(Duration::from_millis(delay)).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if target % 2 == 0 {
                ProbeOutcome::reachable(target)
            } else {
                ProbeOutcome::silent(target)
            }
        }
    }

    struct PanickyProber;

    #[async_trait]
    impl Prober for PanickyProber {
        type Target = u32;

        async fn probe(&self, target: u32, _timeout: Duration) -> ProbeOutcome<u32> {
            if target == 3 {
                panic!("probe blew up");
            }
            ProbeOutcome::reachable(target)
        }
    }

    async fn drain<T>(mut stream: OutcomeStream<T>) -> Vec<ProbeOutcome<T>> {
        let mut outcomes = Vec::new();
        while let Some(outcome) = stream.next().await {
            outcomes.push(outcome);
        }
        outcomes
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn never_exceeds_the_ceiling() {
        for (limit, count) in [(1usize, 20u32), (3, 50), (8, 200), (64, 10)] {
            let prober = Arc::new(GaugeProber::default());
            let stream = Scheduler::new(limit).run(prober.clone(), 0..count, Duration::from_secs(1));

            let outcomes = drain(stream).await;

            assert_eq!(outcomes.len(), count as usize);
            assert!(prober.peak.load(Ordering::SeqCst) <= limit, "limit {limit}");
            assert_eq!(prober.calls.load(Ordering::SeqCst), count as usize);
        }
    }

    #[tokio::test]
    async fn every_target_reported_exactly_once() {
        let prober = Arc::new(GaugeProber::default());
        let stream = Scheduler::new(7).run(prober, 0..100u32, Duration::from_secs(1));

        let outcomes = drain(stream).await;
        let targets: BTreeSet<u32> = outcomes.iter().map(|o| o.target).collect();

        assert_eq!(targets, (0..100).collect());
        assert_eq!(outcomes.iter().filter(|o| o.reachable).count(), 50);
    }

    #[tokio::test]
    async fn empty_and_single_target_sets() {
        let prober = Arc::new(GaugeProber::default());
        let empty = drain(Scheduler::new(4).run(prober.clone(), Vec::<u32>::new(), Duration::from_secs(1))).await;
        assert!(empty.is_empty());

        let single = drain(Scheduler::new(4).run(prober.clone(), vec![42u32], Duration::from_secs(1))).await;
        assert_eq!(single, vec![ProbeOutcome::reachable(42)]);
        assert_eq!(prober.peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_limit_is_raised_to_one() {
        let scheduler = Scheduler::new(0);
        assert_eq!(scheduler.limit(), 1);

        let prober = Arc::new(GaugeProber::default());
        let outcomes = drain(scheduler.run(prober.clone(), 0..5u32, Duration::from_secs(1))).await;
        assert_eq!(outcomes.len(), 5);
        assert_eq!(prober.peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn panicking_probe_is_reported_as_failure() {
        let outcomes = drain(Scheduler::new(2).run(Arc::new(PanickyProber), 0..6u32, Duration::from_secs(1))).await;

        assert_eq!(outcomes.len(), 6);
        let failed: Vec<&ProbeOutcome<u32>> = outcomes.iter().filter(|o| !o.reachable).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].target, 3);
        assert!(failed[0].error.as_deref().unwrap_or_default().starts_with("scheduling error"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn slow_consumer_stalls_admission() {
        let prober = Arc::new(GaugeProber::default());
        let stream = Scheduler::new(3).run(prober.clone(), 0..100u32, Duration::from_secs(1));

        // Nobody reads: at most `limit` outcomes buffered plus `limit` waiting to be queued.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(prober.calls.load(Ordering::SeqCst) <= 6);

        let outcomes = drain(stream).await;
        assert_eq!(outcomes.len(), 100);
        assert!(prober.peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn huge_target_sets_are_consumed_lazily() {
        let prober = Arc::new(GaugeProber::default());
        let mut stream = Scheduler::new(4).run(prober.clone(), 0..u32::MAX, Duration::from_secs(1));

        for _ in 0..10 {
            assert!(stream.next().await.is_some());
        }
        drop(stream);

        // Admission stops soon after the receiver goes away.
        tokio::time::sleep(Duration::from_millis(50)).await;
        let calls = prober.calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(prober.calls.load(Ordering::SeqCst), calls);
        assert!(calls < 100);
    }
}
