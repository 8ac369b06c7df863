//! Credit-tiered loan pricing, option generation, and bounded negotiation.
//!
//! The engine under [`workflows::lending`] is pure arithmetic over request-scoped
//! inputs; configuration, telemetry, and the HTTP surface wrap it for the service
//! binary in `services/api`.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
