//! Core types of the payment engine.

mod attempt;
pub use attempt::*;

mod node;
pub use node::*;

mod target;
pub use target::*;

mod wallet;
pub use wallet::*;
