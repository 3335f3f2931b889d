use derive_new::new;
use serde::{Deserialize, Serialize};

pub use playback::*;
pub use report::*;
pub use video_id::*;

mod playback;
mod report;
mod video_id;
