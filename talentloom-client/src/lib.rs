//! TalentLoom Client - Dashboard Data Layer
//!
//! Application root tying the pieces together:
//! - Configuration loaded from TOML
//! - Typed query bindings with per-resource freshness
//! - Typed mutations with optimistic updates and notifications
//! - Realtime feed wiring and channel bookkeeping

mod client;
pub mod config;
mod mutations;
mod queries;
mod realtime;
pub mod telemetry;

pub use client::{mock_api, TalentloomClient};
pub use config::{ClientConfig, LogFormat, MockApiConfig, RealtimeConfig};
pub use mutations::{MutationInput, MutationOutput};
pub use realtime::DEMO_COMPANY;
