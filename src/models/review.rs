// src/models/review.rs

use serde::{Deserialize, Serialize};

use crate::models::question::Question;

/// A presented question next to what the student answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewItem {
    /// Presentation position, the key the answer was submitted under.
    pub position: usize,
    pub question: Question,
    /// `None` when the question was left unanswered.
    pub student_answer: Option<serde_json::Value>,
    /// Points this answer earned, before any time-expiry override.
    pub awarded: i64,
}

/// Review items in presentation order.
pub type ReviewRecord = Vec<ReviewItem>;

/// Payload parked in the handoff store between submission and the review page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewHandoff {
    pub quiz_id: String,
    pub quiz_name: String,
    pub student_name: String,
    pub score: i64,
    pub items: ReviewRecord,
}
