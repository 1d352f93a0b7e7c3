//! Request handlers.

pub mod crop_health;
pub mod health;
pub mod pest;
pub mod soil;

pub use crop_health::*;
pub use health::*;
pub use pest::*;
pub use soil::*;
