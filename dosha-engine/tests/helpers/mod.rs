//! Test Helper Utilities
//!
//! Shared utilities for testing dosha-engine

#![allow(dead_code)]

pub mod analyzers;
pub mod waveform_generator;

pub use analyzers::{FailingAnalyzer, SlowAnalyzer, StaticAnalyzer};
pub use waveform_generator::{pulse_train, sine_wave, WaveformConfig};
