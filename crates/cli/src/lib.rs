//! Demo tooling for the deconfliction engine.
//!
//! Not part of the production surface: a small client plus a handful of
//! canned flight scenarios, used to drive the server for manual
//! demonstrations of accept/reject/clear behavior.

pub mod client;
pub mod scenarios;

pub use client::{DeconflictionClient, SubmitOutcome};
pub use scenarios::{Scenario, ScenarioDrone};
