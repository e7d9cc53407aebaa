// Library interface for the Sportisode client core
#[macro_use]
pub mod logging;

pub mod api;
pub mod app;
pub mod config;
pub mod live;
pub mod search;
pub mod session;
pub mod storage;
pub mod store;

pub use app::App;
