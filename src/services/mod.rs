//! Service layer separating file I/O from the pipeline

pub mod io;

pub use io::{download_file_name, StampIOService};
