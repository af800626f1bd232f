//! Comment threads on content items, their reactions, and the aggregated display tree.

pub mod aggregate;
pub mod consistency;
pub mod input;
pub mod model;
pub mod reaction;

pub use aggregate::*;
pub use consistency::*;
pub use input::*;
pub use model::*;
pub use reaction::*;
