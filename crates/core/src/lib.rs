//! Core conversion logic for Forexa.
//!
//! This crate contains pure business logic with ZERO web dependencies.
//! Validation rules, rate resolution and precision policy live here.
//!
//! # Modules
//!
//! - `currency` - Input validation, exchange rates and precision-aware conversion
//! - `stress` - Concurrent load runs against a converter

pub mod currency;
pub mod stress;
