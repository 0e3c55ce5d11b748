//! Hierarchical flow diagrams: a row table grouped into a category tree, laid out with a
//! force simulation and labelled around the root.

pub mod app;
pub mod diagram;
pub mod error;
pub mod format;
pub mod layout;
pub mod settings;
pub mod table;

mod util;
