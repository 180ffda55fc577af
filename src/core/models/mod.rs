// src/core/models/mod.rs

pub mod common;
pub mod registration;
pub mod team;
pub mod seeker;
pub mod submission;
pub mod event;
pub mod catalog;

pub use common::*;
pub use registration::*;
pub use team::*;
pub use seeker::*;
pub use submission::*;
pub use event::*;
pub use catalog::*;
