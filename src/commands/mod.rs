pub mod stats;
pub mod trades;

pub use stats::*;
pub use trades::*;
