// src/core/mod.rs

pub mod analytics;
pub mod changes;
pub mod countdown;
pub mod error;
pub mod event_system;
pub mod export;
pub mod file_system;
pub mod matching;
pub mod models;
pub mod participants;
pub mod reporting;
pub mod scoring;
pub mod state;
