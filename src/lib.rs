pub mod api;
pub mod config;
pub mod error;
pub mod logger;
pub mod model;
pub mod supabase;

#[cfg(test)]
pub(crate) mod test_support;

pub mod prelude {
    pub use derive_new::new;
    pub use serde::{Deserialize, Serialize};
    pub use snafu::{Location, OptionExt as _, ResultExt as _, Snafu};
    pub use url::Url;

    pub use crate::model::*;
    pub use crate::supabase::prelude::*;
}
