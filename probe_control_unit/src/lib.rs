//! # Probe Control Unit Library
//!
//! Deterministic firing state machine for a safety-interlocked probe
//! driver. One call to [`controller::FiringController::step`] consumes
//! one tick's input registers and produces that tick's outputs — the
//! trigger and intensity DAC codes, the output-enable gate, and the
//! packed 32-bit status word.
//!
//! ## Layers
//!
//! 1. **validate** — per-tick profile validation and request clamping
//! 2. **controller** — the firing state machine itself
//! 3. **runner** — wall-clock pacing and `tracing` observability
//!
//! ## Zero-Allocation Tick
//!
//! The probe table, LUT, and all state machine storage are fixed-size
//! and owned by the controller at construction. `step()` performs no
//! heap allocation.

pub mod controller;
pub mod runner;
pub mod validate;
