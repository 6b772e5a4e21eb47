//! Common types

pub use crate::app_hash::*;
pub use crate::bridge::*;
pub use crate::bridge_spec::*;
pub use crate::capability::*;
pub use crate::error::*;
pub use crate::manifest::*;
pub use crate::wire::*;
