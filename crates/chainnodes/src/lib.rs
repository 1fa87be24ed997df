//! Standard transform library
//!
//! Generic building blocks for chains: arithmetic, JSON conversion and
//! pass-through helpers. Domain-specific transforms live with the application.

mod arithmetic;
mod debug;
mod time;
mod transform;

pub use arithmetic::{AddNode, MultiplyNode, SubtractNode};
pub use debug::DebugNode;
pub use time::DelayNode;
pub use transform::{JsonParseNode, JsonStringifyNode};
