use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};
use std::sync::Arc;

use chrono::Utc;
use data_types::{CompactionConfig, CompactionStateDecoder, Interval, Segment, SerdeStateDecoder, Timeline};
use observability_deps::tracing::{debug, warn};

use crate::batch::SegmentBatch;
use crate::cursor::HolderCursor;
use crate::error::PlannerError;
use crate::needs_compaction::needs_compaction;
use crate::search_window::build_search_intervals;
use crate::stats::Statistics;
use crate::virtual_timeline::VirtualTimeline;

/// One pending batch, keyed by the umbrella interval of the segments it
/// carries. `Ord` delegates to [`Interval`]'s own `(start, end)` ordering,
/// so a max-heap of these pops the *latest* interval first, breaking ties
/// by datasource name for determinism.
#[derive(Debug, Clone, PartialEq, Eq)]
struct QueueEntry {
    datasource: String,
    segments: Vec<Segment>,
    umbrella: Interval,
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.umbrella.cmp(&other.umbrella).then_with(|| self.datasource.cmp(&other.datasource))
    }
}

/// Iterates compaction batches across every configured datasource,
/// newest-first by umbrella interval.
///
/// See the crate-level docs for the full external contract; in short:
/// construct once from every datasource's config, timeline and operator
/// skip intervals, then drive it with [`Self::has_next`]/[`Self::next`]
/// until exhausted. The planner never blocks and never retains its inputs
/// beyond construction.
#[derive(Debug)]
pub struct CompactionSegmentIterator<'a> {
    configs: HashMap<String, CompactionConfig>,
    cursors: HashMap<String, HolderCursor<'a>>,
    regranulating: HashSet<String>,
    already_emitted: HashMap<String, HashSet<Interval>>,
    queue: BinaryHeap<QueueEntry>,
    compacted_stats: HashMap<String, Statistics>,
    skipped_stats: HashMap<String, Statistics>,
    decoder: Arc<dyn CompactionStateDecoder>,
    /// Corrupt-compaction-state errors, one per offending batch dropped
    /// along the way. Surfaced one at a time by `next()`, ahead of any
    /// queued batch, without halting iteration for the rest of the run.
    pending_errors: VecDeque<PlannerError>,
    /// An invariant violation, once set, poisons the whole iterator:
    /// `has_next()` reports `true` only to deliver this one error, then
    /// `false` forever after.
    fatal_error: Option<PlannerError>,
}

impl<'a> CompactionSegmentIterator<'a> {
    /// Build a planner using the default, `serde_json`-backed decoder for
    /// opaque compaction-state sub-documents.
    pub fn new(
        configs: HashMap<String, CompactionConfig>,
        timelines: HashMap<String, &'a dyn Timeline>,
        skip_intervals: HashMap<String, Vec<Interval>>,
    ) -> Result<Self, PlannerError> {
        Self::with_decoder(configs, timelines, skip_intervals, Arc::new(SerdeStateDecoder))
    }

    /// Build a planner with a caller-supplied decoder, for callers whose
    /// opaque compaction-state sub-documents are not `serde_json::Value`
    /// under the hood.
    pub fn with_decoder(
        configs: HashMap<String, CompactionConfig>,
        timelines: HashMap<String, &'a dyn Timeline>,
        skip_intervals: HashMap<String, Vec<Interval>>,
        decoder: Arc<dyn CompactionStateDecoder>,
    ) -> Result<Self, PlannerError> {
        for datasource in configs.keys() {
            if !timelines.contains_key(datasource) {
                return Err(PlannerError::UnknownDatasource {
                    datasource: datasource.clone(),
                });
            }
        }

        let mut planner = Self {
            configs,
            cursors: HashMap::new(),
            regranulating: HashSet::new(),
            already_emitted: HashMap::new(),
            queue: BinaryHeap::new(),
            compacted_stats: HashMap::new(),
            skipped_stats: HashMap::new(),
            decoder,
            pending_errors: VecDeque::new(),
            fatal_error: None,
        };

        for (datasource, config) in planner.configs.clone() {
            let timeline = timelines[&datasource];
            if timeline.first().is_none() {
                debug!(%datasource, "empty timeline, skipping");
                continue;
            }

            let skips = skip_intervals.get(&datasource).cloned().unwrap_or_default();
            let mut skipped = Statistics::default();

            let target = config.granularity_spec.and_then(|g| g.segment_granularity);
            let cursor = match target {
                Some(target) => {
                    planner.regranulating.insert(datasource.clone());
                    let synthetic_version = Utc::now().to_rfc3339();
                    let virtual_timeline = VirtualTimeline::build(timeline, target, synthetic_version);
                    let granularity = target.as_granularity();
                    let search_intervals = build_search_intervals(
                        virtual_timeline.timeline(),
                        config.skip_offset_from_latest,
                        Some(&*granularity),
                        &skips,
                        &mut skipped,
                    );
                    HolderCursor::new(virtual_timeline.timeline(), &search_intervals, Some(timeline))
                }
                None => {
                    let search_intervals =
                        build_search_intervals(timeline, config.skip_offset_from_latest, None, &skips, &mut skipped);
                    HolderCursor::new(timeline, &search_intervals, None)
                }
            };

            *planner.skipped_stats.entry(datasource.clone()).or_default() = skipped;
            planner.cursors.insert(datasource.clone(), cursor);

            match planner.advance_cursor(&datasource) {
                Ok(Some(entry)) => planner.queue.push(entry),
                Ok(None) => {}
                Err(e) => {
                    warn!(%datasource, error = %e, "invariant violated while seeding planner queue");
                    planner.fatal_error = Some(e);
                    break;
                }
            }
        }

        Ok(planner)
    }

    pub fn has_next(&self) -> bool {
        self.fatal_error.is_some() || !self.pending_errors.is_empty() || !self.queue.is_empty()
    }

    /// The next batch, newest-first by umbrella interval across every
    /// datasource, or `None` once every cursor is exhausted.
    ///
    /// A [`PlannerError::CorruptCompactionState`] surfaces here without
    /// otherwise disturbing the run: the offending batch was already
    /// dropped when it was found, and subsequent calls keep going.
    /// A [`PlannerError::InvariantViolation`] is terminal: once returned,
    /// every later call returns `None`.
    pub fn next(&mut self) -> Option<Result<Vec<Segment>, PlannerError>> {
        if let Some(err) = self.fatal_error.take() {
            self.queue.clear();
            return Some(Err(err));
        }
        if let Some(err) = self.pending_errors.pop_front() {
            return Some(Err(err));
        }

        let entry = self.queue.pop()?;
        match self.advance_cursor(&entry.datasource) {
            Ok(Some(next_entry)) => self.queue.push(next_entry),
            Ok(None) => {}
            Err(e) => self.fatal_error = Some(e),
        }
        Some(Ok(entry.segments))
    }

    pub fn compacted_statistics(&self) -> &HashMap<String, Statistics> {
        &self.compacted_stats
    }

    pub fn skipped_statistics(&self) -> &HashMap<String, Statistics> {
        &self.skipped_stats
    }

    /// Drive one datasource's cursor forward past every already-in-state or
    /// oversized holder until it produces an emittable batch or runs dry.
    /// Implements the batch-finding loop a single cursor advance drives.
    ///
    /// A batch whose compaction state fails to decode is dropped and its
    /// error queued onto `pending_errors` rather than returned here: the
    /// cursor keeps advancing past it, since a bad document on one batch
    /// says nothing about the rest of the datasource's timeline. Only a
    /// cursor contract violation (an empty batch) returns `Err` from this
    /// function, since that is cause to stop trusting the cursor entirely.
    fn advance_cursor(&mut self, datasource: &str) -> Result<Option<QueueEntry>, PlannerError> {
        let config = self
            .configs
            .get(datasource)
            .expect("a queued datasource always has a config");
        let regranulating = self.regranulating.contains(datasource);
        let decoder = Arc::clone(&self.decoder);
        let cursor = self
            .cursors
            .get_mut(datasource)
            .expect("a queued datasource always has a cursor");
        let compacted = self.compacted_stats.entry(datasource.to_string()).or_default();
        let skipped = self.skipped_stats.entry(datasource.to_string()).or_default();
        let already_emitted = self.already_emitted.entry(datasource.to_string()).or_default();

        let mut corrupt_errors = Vec::new();

        let outcome = loop {
            let Some(candidates) = cursor.next() else {
                break Ok(None);
            };
            if candidates.is_empty() {
                break Err(PlannerError::InvariantViolation {
                    detail: format!("holder cursor yielded an empty batch for datasource {datasource}"),
                });
            }

            let batch = SegmentBatch::new(candidates);
            let fits = batch.total_size_bytes() <= config.input_segment_size_bytes;
            let needs = match needs_compaction(config, batch.segments(), decoder.as_ref()) {
                Ok(needs) => needs,
                Err(e) => {
                    corrupt_errors.push(e);
                    continue;
                }
            };

            if fits && needs {
                let umbrella = batch.umbrella_interval().expect("non-empty batch has an umbrella");
                if regranulating && !already_emitted.insert(umbrella) {
                    continue;
                }
                break Ok(Some(QueueEntry {
                    datasource: datasource.to_string(),
                    segments: batch.into_segments(),
                    umbrella,
                }));
            } else if !needs {
                compacted.record_batch(&batch);
            } else {
                skipped.record_batch(&batch);
            }
        };

        self.pending_errors.extend(corrupt_errors);
        outcome
    }
}
