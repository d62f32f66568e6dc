//! Partitioning of identifier lists into Keepa-sized batches and the pacing
//! between consecutive batch calls.

use std::num::NonZeroUsize;
use std::slice::Chunks;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

/// Keepa accepts at most this many identifiers per call.
pub const DEFAULT_BATCH_SIZE: NonZeroUsize = match NonZeroUsize::new(20) {
    Some(size) => size,
    None => unreachable!(),
};
/// Hard ceiling of identifiers per lookup request.
pub const MAX_ASINS_PER_REQUEST: usize = 100;
/// Pause between consecutive batch calls.
pub const DEFAULT_PACING: Duration = Duration::from_secs(1);

/// Tunables of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    pub batch_size: NonZeroUsize,
    pub max_asins: usize,
    pub pacing: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_asins: MAX_ASINS_PER_REQUEST,
            pacing: DEFAULT_PACING,
        }
    }
}

/// Splits `ids` into consecutive groups of at most `batch_size` items.
///
/// Concatenating the result reproduces `ids`; only the last group may be
/// shorter than `batch_size`.
pub fn make_batches<T>(ids: &[T], batch_size: NonZeroUsize) -> Vec<&[T]> {
    ids.chunks(batch_size.get()).collect()
}

/// One step of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchJob<'a, T> {
    /// Zero-based position of the batch.
    pub index: usize,
    pub total: usize,
    pub items: &'a [T],
    /// Pause to observe once this batch finished; `None` after the last one.
    pub pause_after: Option<Duration>,
}

/// Lazy, finite sequence of [`BatchJob`]s over a slice.
///
/// The plan can only be restarted by building a new one.
#[derive(Debug)]
pub struct BatchPlan<'a, T> {
    chunks: Chunks<'a, T>,
    index: usize,
    total: usize,
    pacing: Duration,
}

impl<'a, T> BatchPlan<'a, T> {
    pub fn new(items: &'a [T], batch_size: NonZeroUsize, pacing: Duration) -> Self {
        Self {
            chunks: items.chunks(batch_size.get()),
            index: 0,
            total: items.len().div_ceil(batch_size.get()),
            pacing,
        }
    }

    /// Number of batches in the whole plan.
    pub fn total(&self) -> usize {
        self.total
    }
}

impl<'a, T> Iterator for BatchPlan<'a, T> {
    type Item = BatchJob<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        let items = self.chunks.next()?;
        let index = self.index;
        self.index += 1;
        let pause_after = (self.index < self.total).then_some(self.pacing);
        Some(BatchJob {
            index,
            total: self.total,
            items,
            pause_after,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

/// Clock used to wait between batch calls.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, duration: Duration);
}

/// Production pacer sleeping on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Zero-delay pacer that only records the requested pauses.
#[derive(Debug, Default)]
pub struct RecordingPacer {
    pauses: Mutex<Vec<Duration>>,
}

impl RecordingPacer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses
            .lock()
            .map(|pauses| pauses.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Pacer for RecordingPacer {
    async fn pause(&self, duration: Duration) {
        if let Ok(mut pauses) = self.pauses.lock() {
            pauses.push(duration);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn batches_are_lossless_and_ordered() {
        let ids: Vec<usize> = (0..45).collect();

        let batches = make_batches(&ids, DEFAULT_BATCH_SIZE);

        let sizes: Vec<usize> = batches.iter().map(|b| b.len()).collect();
        assert_eq!(sizes, [20, 20, 5]);
        assert_eq!(batches.concat(), ids);
    }

    #[test]
    fn full_batches_except_possibly_last() {
        for len in 0..=61 {
            let ids: Vec<usize> = (0..len).collect();
            let batches = make_batches(&ids, size(7));
            if let Some((last, rest)) = batches.split_last() {
                assert!(rest.iter().all(|b| b.len() == 7));
                assert!(!last.is_empty() && last.len() <= 7);
            }
            assert_eq!(batches.concat(), ids);
        }
    }

    #[test]
    fn empty_input_yields_no_batches() {
        let ids: Vec<u8> = vec![];
        assert!(make_batches(&ids, DEFAULT_BATCH_SIZE).is_empty());
        assert_eq!(BatchPlan::new(&ids, DEFAULT_BATCH_SIZE, DEFAULT_PACING).count(), 0);
    }

    #[test]
    fn plan_skips_pause_after_last_batch() {
        let ids: Vec<usize> = (0..45).collect();
        let plan = BatchPlan::new(&ids, DEFAULT_BATCH_SIZE, Duration::from_millis(250));
        assert_eq!(plan.total(), 3);

        let jobs: Vec<_> = plan.collect();

        let pauses: Vec<_> = jobs.iter().map(|job| job.pause_after).collect();
        assert_eq!(
            pauses,
            [
                Some(Duration::from_millis(250)),
                Some(Duration::from_millis(250)),
                None
            ]
        );
        assert_eq!(jobs[2].index, 2);
        assert_eq!(jobs[2].total, 3);
        assert_eq!(jobs[2].items, &ids[40..]);
    }

    #[test]
    fn single_batch_plan_never_pauses() {
        let ids = [1, 2, 3];
        let jobs: Vec<_> = BatchPlan::new(&ids, DEFAULT_BATCH_SIZE, DEFAULT_PACING).collect();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].pause_after, None);
    }

    #[tokio::test]
    async fn recording_pacer_does_not_sleep() {
        let pacer = RecordingPacer::new();
        pacer.pause(Duration::from_secs(3600)).await;
        assert_eq!(pacer.pauses(), [Duration::from_secs(3600)]);
    }
}
