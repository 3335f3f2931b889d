pub use player::*;
pub use report::*;

mod player;
mod report;
