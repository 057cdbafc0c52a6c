//! Assay reduction CLI library surface.

pub mod logging;
