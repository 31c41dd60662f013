pub mod completions;
pub mod convert;
pub mod fetch;
pub mod index;
pub mod stats;
