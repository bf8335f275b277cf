use data_types::{CompactionConfig, CompactionStateDecoder, GranularitySpec, Segment};

use crate::error::PlannerError;

/// Diff a non-empty candidate batch's actual compaction state against the
/// desired `config`, applying the rules below in order.
///
/// Panics if `candidates` is empty — callers (the holder cursor) guarantee
/// non-empty batches; an empty batch reaching here is
/// [`PlannerError::InvariantViolation`] territory one layer up, not a
/// silent `false`.
pub fn needs_compaction(
    config: &CompactionConfig,
    candidates: &[Segment],
    decoder: &dyn CompactionStateDecoder,
) -> Result<bool, PlannerError> {
    assert!(!candidates.is_empty(), "needs_compaction requires a non-empty batch");

    // Rule 1: any segment never compacted.
    if candidates.iter().any(|s| s.last_compaction_state().is_none()) {
        return Ok(true);
    }

    // Rule 2: candidates disagree on last compaction state.
    let first_state = candidates[0].last_compaction_state().expect("checked above");
    if candidates
        .iter()
        .any(|s| s.last_compaction_state().expect("checked above") != first_state)
    {
        return Ok(true);
    }

    let offending = &candidates[0];
    let corrupt = |detail: String| PlannerError::CorruptCompactionState {
        datasource: offending.datasource().to_string(),
        segment_id: offending.id(),
        detail,
    };

    // Rule 3: effective partitions spec.
    let effective_partitions = config.effective_partitions_spec().normalized();
    if effective_partitions != first_state.partitions_spec.normalized() {
        return Ok(true);
    }

    // Rule 4: effective index spec.
    if config.effective_index_spec() != first_state.index_spec {
        return Ok(true);
    }

    let config_granularity = config.granularity_spec.unwrap_or_default();
    let stored_granularity: Option<GranularitySpec> = match &first_state.granularity_spec {
        Some(doc) => Some(
            decoder
                .decode_granularity_spec(doc)
                .map_err(|e| corrupt(e.to_string()))?,
        ),
        None => None,
    };

    // Rule 5: segment granularity.
    if let Some(configured) = config_granularity.segment_granularity {
        let disagrees = match &stored_granularity {
            None => candidates
                .iter()
                .any(|s| !configured.as_granularity().is_aligned(s.interval())),
            Some(stored) => stored.segment_granularity != Some(configured),
        };
        if disagrees {
            return Ok(true);
        }
    }

    // Rule 6: rollup.
    if let Some(configured) = config_granularity.rollup {
        let stored_rollup = stored_granularity.as_ref().and_then(|g| g.rollup);
        if stored_rollup != Some(configured) {
            return Ok(true);
        }
    }

    // Rule 7: query granularity.
    if let Some(configured) = config_granularity.query_granularity {
        let stored_query_granularity = stored_granularity.as_ref().and_then(|g| g.query_granularity);
        if stored_query_granularity != Some(configured) {
            return Ok(true);
        }
    }

    // Rule 8: dimensions.
    if let Some(configured_dims) = &config.dimensions_spec {
        let stored_dims = match &first_state.dimensions_spec {
            Some(doc) => Some(
                decoder
                    .decode_dimensions_spec(doc)
                    .map_err(|e| corrupt(e.to_string()))?,
            ),
            None => None,
        };
        if stored_dims.as_ref() != Some(configured_dims) {
            return Ok(true);
        }
    }

    // Rule 9: transform/filter.
    if let Some(configured_filter) = &config.transform_spec {
        let stored_filter = match &first_state.transform_spec {
            Some(doc) => Some(
                decoder
                    .decode_transform_spec(doc)
                    .map_err(|e| corrupt(e.to_string()))?,
            ),
            None => None,
        };
        if stored_filter.as_ref() != Some(configured_filter) {
            return Ok(true);
        }
    }

    // Rule 10: metrics.
    if let Some(configured_metrics) = &config.metrics_spec {
        if !configured_metrics.is_empty() {
            let stored_metrics = match &first_state.metrics_spec {
                Some(doc) => Some(
                    decoder
                        .decode_metrics_spec(doc)
                        .map_err(|e| corrupt(e.to_string()))?,
                ),
                None => None,
            };
            if stored_metrics.as_ref() != Some(configured_metrics) {
                return Ok(true);
            }
        }
    }

    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{DateTime, Duration, Utc};
    use data_types::{
        DimensionsSpec, GranularityValue, IndexSpec, Interval, LastCompactionState, PartitionsSpec,
        SerdeStateDecoder, ShardSpec,
    };
    use serde_json::json;

    fn dt(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn day() -> Interval {
        Interval::new(dt("2024-01-01T00:00:00Z"), dt("2024-01-02T00:00:00Z")).unwrap()
    }

    fn minimal_config() -> CompactionConfig {
        CompactionConfig {
            input_segment_size_bytes: 1_000_000_000,
            skip_offset_from_latest: Duration::zero(),
            granularity_spec: None,
            dimensions_spec: None,
            transform_spec: None,
            metrics_spec: None,
            index_spec: None,
            partitions_spec: None,
            max_rows_per_segment: Some(5_000_000),
            max_total_rows: None,
        }
    }

    fn compacted_state() -> LastCompactionState {
        LastCompactionState {
            partitions_spec: PartitionsSpec::dynamic(Some(5_000_000), None),
            index_spec: IndexSpec::default(),
            granularity_spec: None,
            dimensions_spec: None,
            transform_spec: None,
            metrics_spec: None,
        }
    }

    fn segment_with_state(state: Option<LastCompactionState>) -> Segment {
        Segment::new("ds", day(), "v1", ShardSpec::single(), 100, state)
    }

    #[test]
    fn never_compacted_needs_compaction() {
        let config = minimal_config();
        let candidates = vec![segment_with_state(None)];
        assert!(needs_compaction(&config, &candidates, &SerdeStateDecoder).unwrap());
    }

    #[test]
    fn matching_state_does_not_need_compaction() {
        let config = minimal_config();
        let candidates = vec![segment_with_state(Some(compacted_state()))];
        assert!(!needs_compaction(&config, &candidates, &SerdeStateDecoder).unwrap());
    }

    #[test]
    fn heterogeneous_candidate_states_need_compaction() {
        let config = minimal_config();
        let mut other_state = compacted_state();
        other_state.index_spec.dimension_compression = data_types::Compression::Uncompressed;
        let candidates = vec![
            segment_with_state(Some(compacted_state())),
            segment_with_state(Some(other_state)),
        ];
        assert!(needs_compaction(&config, &candidates, &SerdeStateDecoder).unwrap());
    }

    #[test]
    fn differing_partitions_spec_needs_compaction() {
        let mut config = minimal_config();
        config.max_rows_per_segment = Some(1_000);
        let candidates = vec![segment_with_state(Some(compacted_state()))];
        assert!(needs_compaction(&config, &candidates, &SerdeStateDecoder).unwrap());
    }

    #[test]
    fn dynamic_partitions_spec_normalizes_unbounded_max_total_rows() {
        let mut config = minimal_config();
        config.partitions_spec = Some(PartitionsSpec::dynamic(Some(5_000_000), Some(u64::MAX)));
        let candidates = vec![segment_with_state(Some(compacted_state()))];
        // stored state has max_total_rows = None, config has it explicitly unbounded:
        // normalization should make these equal.
        assert!(!needs_compaction(&config, &candidates, &SerdeStateDecoder).unwrap());
    }

    #[test]
    fn unaligned_segment_needs_compaction_when_granularity_set_and_state_absent() {
        let mut config = minimal_config();
        config.granularity_spec = Some(GranularitySpec {
            segment_granularity: Some(GranularityValue::Day),
            query_granularity: None,
            rollup: None,
        });
        // segment interval is `day()`, which IS aligned to Day, so first check it passes:
        let candidates = vec![segment_with_state(Some(compacted_state()))];
        assert!(needs_compaction(&config, &candidates, &SerdeStateDecoder).unwrap());

        // misaligned interval needs compaction too
        let half_day = Interval::new(dt("2024-01-01T00:00:00Z"), dt("2024-01-01T12:00:00Z")).unwrap();
        let misaligned = Segment::new("ds", half_day, "v1", ShardSpec::single(), 100, Some(compacted_state()));
        assert!(needs_compaction(&config, &[misaligned], &SerdeStateDecoder).unwrap());
    }

    #[test]
    fn matching_granularity_in_stored_state_does_not_need_compaction() {
        let mut config = minimal_config();
        config.granularity_spec = Some(GranularitySpec {
            segment_granularity: Some(GranularityValue::Day),
            query_granularity: Some(GranularityValue::Hour),
            rollup: Some(true),
        });
        let mut state = compacted_state();
        state.granularity_spec = Some(json!({
            "segment_granularity": "day",
            "query_granularity": "hour",
            "rollup": true,
        }));
        let candidates = vec![segment_with_state(Some(state))];
        assert!(!needs_compaction(&config, &candidates, &SerdeStateDecoder).unwrap());
    }

    #[test]
    fn differing_rollup_needs_compaction() {
        let mut config = minimal_config();
        config.granularity_spec = Some(GranularitySpec {
            segment_granularity: None,
            query_granularity: None,
            rollup: Some(true),
        });
        let mut state = compacted_state();
        state.granularity_spec = Some(json!({"rollup": false}));
        let candidates = vec![segment_with_state(Some(state))];
        assert!(needs_compaction(&config, &candidates, &SerdeStateDecoder).unwrap());
    }

    #[test]
    fn differing_dimensions_needs_compaction() {
        let mut config = minimal_config();
        config.dimensions_spec = Some(DimensionsSpec {
            dimensions: vec!["host".to_string()],
        });
        let candidates = vec![segment_with_state(Some(compacted_state()))];
        assert!(needs_compaction(&config, &candidates, &SerdeStateDecoder).unwrap());
    }

    #[test]
    fn differing_filter_needs_compaction() {
        let mut config = minimal_config();
        config.transform_spec = Some(json!({"type": "selector", "dimension": "host", "value": "a"}));
        let candidates = vec![segment_with_state(Some(compacted_state()))];
        assert!(needs_compaction(&config, &candidates, &SerdeStateDecoder).unwrap());
    }

    #[test]
    fn empty_metrics_config_does_not_force_compaction() {
        let mut config = minimal_config();
        config.metrics_spec = Some(Vec::new());
        let candidates = vec![segment_with_state(Some(compacted_state()))];
        assert!(!needs_compaction(&config, &candidates, &SerdeStateDecoder).unwrap());
    }

    #[test]
    fn corrupt_stored_granularity_doc_surfaces_as_planner_error() {
        let mut config = minimal_config();
        config.granularity_spec = Some(GranularitySpec {
            segment_granularity: Some(GranularityValue::Day),
            query_granularity: None,
            rollup: None,
        });
        let mut state = compacted_state();
        state.granularity_spec = Some(json!({"segment_granularity": "not_a_granularity"}));
        let candidates = vec![segment_with_state(Some(state))];
        let err = needs_compaction(&config, &candidates, &SerdeStateDecoder).unwrap_err();
        assert_matches!(err, PlannerError::CorruptCompactionState { .. });
    }

    #[test]
    #[should_panic(expected = "non-empty batch")]
    fn panics_on_empty_candidates() {
        let config = minimal_config();
        let _ = needs_compaction(&config, &[], &SerdeStateDecoder);
    }
}
