//! Excel report output

pub mod writer;

pub use writer::write_report_to_xlsx;
