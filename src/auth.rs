//! OAuth credential model and the lifecycle that answers "should you refresh".

pub mod credential;
pub mod lifecycle;
pub mod secret;

pub use credential::*;
pub use lifecycle::*;
pub use secret::*;
