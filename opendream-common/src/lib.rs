//! OpenDream Common Types
//!
//! Wire types and payload helpers shared by the relay server and its clients.

pub mod data_uri;
pub mod health;
pub mod inpaint;

pub use health::{EngineStatus, HealthResponse};
pub use inpaint::{ErrorResponse, GenerateRequest, GenerateResponse};
