use serde::{Deserialize, Serialize};

use crate::error::DataTypeError;

/// A segment's position within the partition set of its version's
/// time-chunk: partition `partition_num` of `num_partitions` total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShardSpec {
    partition_num: u32,
    num_partitions: u32,
}

impl ShardSpec {
    pub fn new(partition_num: u32, num_partitions: u32) -> Result<Self, DataTypeError> {
        if partition_num >= num_partitions {
            return Err(DataTypeError::InvalidShardSpec {
                partition_num,
                num_partitions,
            });
        }
        Ok(Self {
            partition_num,
            num_partitions,
        })
    }

    /// A single-partition shard spec (`p = 0`, `P = 1`).
    pub fn single() -> Self {
        Self {
            partition_num: 0,
            num_partitions: 1,
        }
    }

    pub fn partition_num(&self) -> u32 {
        self.partition_num
    }

    pub fn num_partitions(&self) -> u32 {
        self.num_partitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_partition() {
        assert!(ShardSpec::new(3, 3).is_err());
        assert!(ShardSpec::new(5, 3).is_err());
        assert!(ShardSpec::new(0, 1).is_ok());
    }
}
