//! Data module - CSV loading, filtering and detail tables

mod detail;
mod filter;
mod frame;
mod loader;
mod record;

pub use detail::{detail_tables, DetailRow, DetailTable};
pub use filter::{clamp_to, filter_dataset, filter_frame, FilterCriteria, FilteredView, InvalidDateRange};
pub use frame::{frame_to_records, from_epoch_days};
pub use loader::{parse_date, DataLoader, LoaderError};
pub use record::{Capabilities, CaseRecord, Dataset, Metric, DATE_COLUMN, REGION_COLUMN};
