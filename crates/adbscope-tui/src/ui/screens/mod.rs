mod record_table;

pub use record_table::{RecordTableScreen, autosize_columns};
