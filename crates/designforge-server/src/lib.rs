//! DesignForge HTTP API.
//!
//! Endpoints live under `/api`: `health`, `generate`, `variants`,
//! `select-best`, `iterations`, `iterations/select-best`,
//! `storyboard/translate`, `comparison`, `manufacturability`, `parameters`
//! and `images/<file>`. Business failures answer `200` with
//! `success: false`; malformed requests get `4xx`.

pub mod api;
pub mod config;
pub mod routes;
pub mod state;

pub use config::{ServerArgs, IMAGE_URL_PREFIX};
pub use routes::routes;
pub use state::AppState;
