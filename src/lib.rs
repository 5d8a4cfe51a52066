//! # rgbpay
//!
//! Payment engine for wallets backed by an RGB-enabled lightning node: turns
//! raw user input into a validated payment action, submits it over the node's
//! HTTP API and tracks settlement to a terminal state under unreliable
//! network conditions.

pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod payments;
pub mod resolver;
pub mod types;
pub mod unlock;
pub mod validate;
