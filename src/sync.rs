use crate::event::{Event, EventStream};
use crate::skeleton::{Skeleton13, SkeletonSample};

/// One synchronization step: the events since the previous skeleton sample,
/// the pose they belong to, and its timestamp.
#[derive(Clone, Debug)]
pub struct AlignedBatch {
    pub events: Vec<Event>,
    pub pose: Skeleton13,
    pub timestamp: f64,
}

/// Aligns an asynchronous event stream to a fixed-rate skeleton stream.
///
/// Skeleton samples act as synchronization boundaries: each emitted batch
/// holds the events in `(prev_sample_ts, sample_ts]`, so batches partition
/// the event stream into contiguous, non-overlapping runs in original order.
/// The first batch has no lower bound; events after the last skeleton sample
/// are discarded since there is no later label to attach them to. A sample
/// interval without events yields an empty batch, not a skipped step.
///
/// Both inputs must be sorted ascending by timestamp. Single forward pass;
/// construct a fresh aligner to replay.
pub struct StreamAligner {
    events: EventStream,
    samples: Vec<SkeletonSample>,
    event_cursor: usize,
    sample_cursor: usize,
}

impl StreamAligner {
    pub fn new(events: EventStream, samples: Vec<SkeletonSample>) -> Self {
        Self {
            events,
            samples,
            event_cursor: 0,
            sample_cursor: 0,
        }
    }

    /// Number of steps this aligner will emit in total.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl Iterator for StreamAligner {
    type Item = AlignedBatch;

    fn next(&mut self) -> Option<AlignedBatch> {
        let sample = *self.samples.get(self.sample_cursor)?;
        self.sample_cursor += 1;

        let mut batch = Vec::new();
        while let Some(ev) = self.events.get(self.event_cursor) {
            if ev.timestamp > sample.timestamp {
                break;
            }
            batch.push(ev);
            self.event_cursor += 1;
        }

        Some(AlignedBatch {
            events: batch,
            pose: sample.joints,
            timestamp: sample.timestamp,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.samples.len() - self.sample_cursor;
        (remaining, Some(remaining))
    }
}
