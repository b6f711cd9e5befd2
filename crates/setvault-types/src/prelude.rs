pub use crate::error::{Error, SvResult};
pub use crate::types::{Category, Timestamp};

pub use tracing::{debug, error, info, warn};

// vim: ts=4
