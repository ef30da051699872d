//! TalentPulse engine crate.
//!
//! Hosts the organizational psychosocial-health workflow (TFCI, NR-1, and COPC
//! assessments blended into composite scores, risk tiers, and action plans)
//! together with the service-wide configuration, telemetry, and error plumbing.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
