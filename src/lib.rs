//! Chat bot gateway that turns prompts into stories.
//!
//! Every `story` command passes through a per-user quota before any
//! generation work happens. Quota records live in a shared store and are
//! updated with compare-and-set transactions, so concurrent requests from
//! one user, even across instances, can never overspend the window.

pub mod clock;
pub mod config;
pub mod discord;
pub mod dispatch;
pub mod error;
pub mod generation;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod quota;
pub mod state;
pub mod store;
