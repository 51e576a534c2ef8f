pub mod record;
pub mod loader;
pub mod summary;
pub mod impute;
pub mod scale;
pub mod split;
pub mod manager;

pub use record::{Dataset, Feature, Outcome, Record, NUM_FEATURES};
pub use impute::ImputationTable;
pub use scale::ScalingModel;
pub use split::{Partition, PartitionKind, Partitions, SplitConfig};
pub use summary::{ColumnSummary, Histogram};
pub use manager::{DataManager, PreparedData};
