pub mod format;

pub use format::{Format, FormatError, Representation};
