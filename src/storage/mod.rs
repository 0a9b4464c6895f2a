//! CSV persistence shared by the history ledger and the expiry report.

pub mod csv_store;

pub use csv_store::{
    append_records, default_header, read_first_column, read_records, sort_file, write_header_only,
    write_records, RecordTable,
};
