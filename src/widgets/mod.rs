pub mod disk_table;
pub mod network_graph;
pub mod process_table;
pub mod summary_block;
pub mod usage_gauges;

pub use self::disk_table::DiskTableWidget;
pub use self::network_graph::NetworkWidget;
pub use self::process_table::ProcessTableWidget;
pub use self::summary_block::SummaryWidget;
pub use self::usage_gauges::UsageWidget;
