// src/engine/mod.rs

pub mod grader;
pub mod practice;
pub mod selector;
pub mod session;

pub use session::QuizEngine;
