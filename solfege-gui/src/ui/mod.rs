//! # UI Module
//!
//! This module contains all UI components for the Solfege singing trainer.

pub mod main_display;
pub mod scale_ladder;
