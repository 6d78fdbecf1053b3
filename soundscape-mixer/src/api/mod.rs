//! HTTP control surface for the mixer
//!
//! Thin adapter: every route maps onto one `MixEngine` operation.

pub mod handlers;
pub mod server;
pub mod sse;

pub use server::{create_router, run, AppContext};
