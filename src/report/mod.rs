//! Output generation.
//!
//! This module renders and writes the per-group CSV hash files.

pub mod csv;

pub use csv::{output_file_name, render_csv, write_group_csv};
