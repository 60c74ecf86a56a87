//! Request handlers.

pub mod detect;
pub mod health;
pub mod process;

pub use detect::*;
pub use health::*;
pub use process::*;
