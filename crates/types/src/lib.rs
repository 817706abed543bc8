// crates/types/src/lib.rs
pub mod job;
pub mod time;

pub use job::*;
pub use time::*;
