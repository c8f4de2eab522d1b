//! Voicebot Library
//!
//! Core modules for the voicebot conversational assistant.

pub mod asr;
pub mod audio;
pub mod audit;
pub mod config;
pub mod controller;
pub mod dialogue;
pub mod error;
pub mod intent;
pub mod launcher;
pub mod tts;
