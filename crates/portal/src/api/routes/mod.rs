//! Route handlers for the portal API

pub mod health;
pub mod pillars;
pub mod sync;
pub mod system;

pub use health::*;
pub use pillars::*;
pub use sync::*;
pub use system::*;
