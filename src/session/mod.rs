//! The watch session: eligibility rule, state machine and the task that drives it.

pub use eligibility::*;
pub use state::*;
pub use task::*;

mod eligibility;
mod state;
mod task;
