//! Business logic services
//!
//! Handlers stay thin; the multi-step flows (LLM calls, persistence,
//! rendering, uploads) live here.

pub mod chart;
pub mod export;
pub mod extract;
pub mod generation;
pub mod knowledge;
pub mod polish;
pub mod quality;
pub mod translation;
