pub mod csv_file;
pub mod json_file;
pub mod memory;

pub use csv_file::CsvSink;
pub use json_file::JsonSink;
pub use memory::MemorySink;
