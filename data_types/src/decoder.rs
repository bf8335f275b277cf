use std::fmt::Debug;

use serde::de::DeserializeOwned;

use crate::compaction_state::{DimensionsSpec, GranularitySpec, MetricSpec};

/// A sub-document of [`LastCompactionState`](crate::LastCompactionState)
/// failed to decode into the shape a [`CompactionStateDecoder`] expected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct DecodeError {
    pub field: &'static str,
    pub message: String,
}

/// Decodes the opaque sub-documents carried by [`LastCompactionState`
/// ](crate::LastCompactionState) into typed values.
///
/// `LastCompactionState`'s granularity/dimensions/transform/metrics
/// sub-fields arrive as [`serde_json::Value`] "tagged value trees" rather
/// than already-typed structs, because whatever produced the segment
/// metadata may be running a different, independently-evolving schema for
/// those sub-documents than this crate's own. Decoding is deferred to the
/// point the needs-compaction predicate actually needs a typed value to
/// compare, and the decoding strategy itself is an injected capability
/// rather than hardcoded, so a caller whose documents don't map directly
/// onto [`GranularitySpec`]/[`DimensionsSpec`]/[`MetricSpec`] can supply
/// their own.
pub trait CompactionStateDecoder: Debug + Send + Sync {
    fn decode_granularity_spec(&self, doc: &serde_json::Value) -> Result<GranularitySpec, DecodeError>;
    fn decode_dimensions_spec(&self, doc: &serde_json::Value) -> Result<DimensionsSpec, DecodeError>;
    fn decode_transform_spec(&self, doc: &serde_json::Value) -> Result<serde_json::Value, DecodeError>;
    fn decode_metrics_spec(&self, doc: &serde_json::Value) -> Result<Vec<MetricSpec>, DecodeError>;
}

/// The default [`CompactionStateDecoder`]: plain `serde` deserialization of
/// each sub-document into its expected shape.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerdeStateDecoder;

impl SerdeStateDecoder {
    fn decode<T: DeserializeOwned>(field: &'static str, doc: &serde_json::Value) -> Result<T, DecodeError> {
        serde_json::from_value(doc.clone()).map_err(|e| DecodeError {
            field,
            message: e.to_string(),
        })
    }
}

impl CompactionStateDecoder for SerdeStateDecoder {
    fn decode_granularity_spec(&self, doc: &serde_json::Value) -> Result<GranularitySpec, DecodeError> {
        Self::decode("granularity_spec", doc)
    }

    fn decode_dimensions_spec(&self, doc: &serde_json::Value) -> Result<DimensionsSpec, DecodeError> {
        Self::decode("dimensions_spec", doc)
    }

    fn decode_transform_spec(&self, doc: &serde_json::Value) -> Result<serde_json::Value, DecodeError> {
        // The filter document's own shape is not this crate's concern: it
        // is compared structurally, never interpreted, so it passes through
        // unchanged. Still routed through the decoder so a caller with a
        // stricter schema can reject malformed filters here.
        Ok(doc.clone())
    }

    fn decode_metrics_spec(&self, doc: &serde_json::Value) -> Result<Vec<MetricSpec>, DecodeError> {
        Self::decode("metrics_spec", doc)
    }
}
