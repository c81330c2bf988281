//! HTTP API handlers for quakesafe-web

pub mod buildinfo;
pub mod chat;
pub mod health;
pub mod submit;
pub mod ui;

pub use buildinfo::buildinfo_routes;
pub use chat::chat_routes;
pub use health::health_routes;
pub use submit::submit_routes;
pub use ui::ui_routes;
