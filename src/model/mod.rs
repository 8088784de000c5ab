use derive_new::new;
use serde::{Deserialize, Serialize};

pub use event::*;
pub use id::*;
pub use timestamp::*;
pub use tracker::*;

mod event;
mod id;
mod timestamp;
mod tracker;
