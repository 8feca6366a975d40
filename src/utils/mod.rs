//! Utils Module
pub mod logging;
pub mod truncate;

pub use logging::init_logging;
pub use truncate::{truncate_text, TruncationPolicy};
