//! The server's shared application state.

pub mod live_state;
mod store;

pub use store::AppState;
