//! stressplan-core — deterministic financial stress-testing engine.
//!
//! Projects a business plan's KPIs forward from a driver series, applies
//! timed shocks (scenarios) and countermeasures (mitigations) to those
//! drivers, and deterministically recomputes the resulting trajectories
//! so stressed and mitigated outcomes can be compared against baseline.
//!
//! PIPELINE:
//!   drivers --kpi_spine--> KPIs --derived--> ratios
//!   scenario/mitigation --shock (+curve)--> perturbed drivers --(same pipeline)
//!   runs --compare / breakpoint / survival+risk--> verdicts
//!
//! RULES:
//!   - Every computation is pure: identical inputs, identical outputs,
//!     bit for bit. No randomness, no clocks, no hidden state.
//!   - Missing data is `None` and propagates; it never becomes zero and
//!     it never throws.
//!   - Structurally invalid input (unknown keys, omitted drivers) fails
//!     fast at the boundary with a descriptive error.

pub mod boundary;
pub mod breakpoint;
pub mod compare;
pub mod config;
pub mod curve;
pub mod derived;
pub mod driver;
pub mod engine;
pub mod error;
pub mod kpi_spine;
pub mod run;
pub mod shock;
pub mod stats;
pub mod store;
pub mod survival;
pub mod types;
