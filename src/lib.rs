// Crate root library declaration and module exports.
pub mod client;
pub mod config;
pub mod context;
pub mod controller;
pub mod error;
pub mod extraction;
pub mod intake;
pub mod logging;
pub mod model;
pub mod quantity;
pub mod session;

#[cfg(feature = "tui")]
pub mod tui;
