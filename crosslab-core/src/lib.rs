//! CrossLab Core — bar domain, indicator pipeline, signal pairing, and the
//! position lifecycle engine.
//!
//! This crate contains the heart of the simulator:
//! - Domain types (bars, sides, trade rows, P&L rows)
//! - Indicator pipeline (EMA family, smoothed TEMA, two-hour RSI, impulse)
//! - Cross/touch signal detection and the pairing-window state machine
//! - Geometric stop resolver with zone candidates and TEMA fallback
//! - Risk-based sizing, breakeven arithmetic, trade accounting
//! - The bar-by-bar simulation loop producing trade and P&L rows

pub mod domain;
pub mod engine;
pub mod fingerprint;
pub mod indicators;
pub mod math;
pub mod signal;
