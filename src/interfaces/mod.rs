//! Input and output formats at the process boundary.

pub mod csv;
pub mod json;
