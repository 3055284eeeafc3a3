// Library exports for luno-server
// The binary and the integration tests build on these modules

pub mod api;
pub mod clock;
pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod feed;
pub mod graph;
pub mod identity;
pub mod media;
pub mod messaging;
pub mod session;
pub mod state;
