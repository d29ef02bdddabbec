// src/models/mod.rs

pub mod attempt;
pub mod leaderboard;
pub mod practice;
pub mod question;
pub mod quiz;
pub mod review;
pub mod user;
