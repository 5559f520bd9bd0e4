pub mod record_detail;
pub mod resource_table;

pub use record_detail::RecordDetailView;
pub use resource_table::ResourceTableView;
