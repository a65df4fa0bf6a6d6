//! Client-side session and navigation model.
//!
//! The server never holds session state, so the client carries its own copy:
//! one [`session::SessionStore`] broadcasting over a watch channel, one
//! authoritative [`guard::NavGuard`] reconciling the current route with
//! token presence, and an [`api::ApiClient`] that attaches the bearer token
//! and feeds authentication failures back into the store. Subtree guards are
//! passive [`guard::RenderGate`] observers of the same channel.

pub mod api;
pub mod guard;
pub mod notify;
pub mod session;
