//! Card Catalogue service: the fixed 39-card pool and the sampling
//! operations the game coordinator and public API read from it.

pub mod catalogue;
pub mod client;
pub mod routes;

pub use client::CardsClient;
pub use routes::{router, CardsState};
