pub mod csv;

pub use csv::{export_file, import_file, import_files, read_dipoles, write_dipoles, CSV_HEADER};
