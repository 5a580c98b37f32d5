pub mod engine;
pub mod targets;

pub use engine::{classify, classify_ph, classify_reading, PhClass};
pub use targets::lookup;
