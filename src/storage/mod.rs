// Storage module - delimited text files, one per table

pub mod csv_codec;
mod csv_file;

pub use csv_file::{CsvData, CsvFile};
