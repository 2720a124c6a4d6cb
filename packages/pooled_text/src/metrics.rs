//! Metrics for the text buffer pool.
//!
//! The events are per-thread instances to keep pool operations free of metrics contention.

use nm::{Event, Magnitude};

/// Histogram buckets for the capacity of dropped buffers in bytes.
///
/// Buffers below the retained capacity limit are only dropped when the idle list is full, so the
/// small buckets show idle count pressure and the large ones show oversized statements.
const RETIRED_CAPACITY_BYTES_BUCKETS: &[Magnitude] = &[
    256, 1024, 4096, 16_384, 65_536, 262_144, 1_048_576, 4_194_304, 16_777_216,
];

thread_local! {
    /// Every buffer handed out by a pool.
    pub(crate) static BUFFERS_ACQUIRED: Event = Event::builder()
        .name("pooled_text_acquired")
        .build();

    /// Acquisitions served from an idle buffer instead of a fresh allocation.
    pub(crate) static BUFFERS_REUSED: Event = Event::builder()
        .name("pooled_text_reused")
        .build();

    /// Released buffers that the pool dropped instead of keeping, because of its idle count or
    /// retained capacity limits.
    ///
    /// The magnitude is the capacity of the dropped buffer in bytes.
    pub(crate) static BUFFERS_RETIRED: Event = Event::builder()
        .name("pooled_text_retired_bytes")
        .histogram(RETIRED_CAPACITY_BYTES_BUCKETS)
        .build();

    /// Buffers whose storage was handed over to the caller instead of being returned.
    pub(crate) static BUFFERS_DETACHED: Event = Event::builder()
        .name("pooled_text_detached")
        .build();
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use nm::Report;

    use super::*;

    #[test]
    fn retired_capacity_is_a_histogram() {
        BUFFERS_RETIRED.with(|e| e.observe(300_usize));

        let report = Report::collect();
        let retired = report
            .events()
            .find(|event| event.name() == "pooled_text_retired_bytes")
            .expect("the event was observed on this thread");

        let histogram = retired.histogram().expect("retired capacity has buckets");
        assert_eq!(
            histogram.magnitudes().collect::<Vec<_>>(),
            RETIRED_CAPACITY_BYTES_BUCKETS
        );
    }
}
