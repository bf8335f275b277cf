//! Shared value types for the compaction planner: time intervals,
//! granularities, segments and their shard specs, the per-segment
//! compaction-state record, compaction configuration, and the versioned
//! timeline those are all organized by.

mod compaction_state;
mod config;
mod decoder;
mod error;
mod granularity;
mod interval;
mod segment;
mod shard_spec;
mod timeline;

pub use compaction_state::{
    BitmapEncoding, Compression, DimensionsSpec, GranularitySpec, IndexSpec, LastCompactionState,
    MetricSpec, PartitionsSpec,
};
pub use config::CompactionConfig;
pub use decoder::{CompactionStateDecoder, DecodeError, SerdeStateDecoder};
pub use error::DataTypeError;
pub use granularity::{AllGranularity, CalendarGranularity, FixedGranularity, Granularity, GranularityValue};
pub use interval::Interval;
pub use segment::{PartitionChunk, Segment};
pub use shard_spec::ShardSpec;
pub use timeline::{InMemoryTimeline, Timeline, TimelineHolder};
