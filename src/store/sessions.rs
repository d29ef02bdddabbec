// src/store/sessions.rs

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use uuid::Uuid;

use crate::models::attempt::Attempt;

/// Header carrying the opaque session token on student requests.
pub const SESSION_HEADER: &str = "x-quiz-session";

/// A review waiting to be read, pointing into the handoff store.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingReview {
    pub quiz_id: String,
    pub handoff_token: String,
}

/// Everything the server remembers about one anonymous student.
#[derive(Debug, Clone, Default)]
pub struct StudentSession {
    pub attempt: Option<Attempt>,
    pub pending_review: Option<PendingReview>,
    /// Name used on the last submission, for highlighting on the leaderboard.
    pub last_result_name: Option<String>,
}

struct Slot {
    session: StudentSession,
    expires_at: Instant,
}

/// Server-side transient state keyed by session token, with a sliding TTL.
///
/// Every mutation happens under one lock, so `take_attempt` and
/// `take_pending_review` hand their value to at most one caller.
#[derive(Clone)]
pub struct SessionStore {
    slots: Arc<Mutex<HashMap<String, Slot>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` on a live session, refreshing its TTL. Expired sessions are
    /// dropped and treated as unknown.
    fn with_live<R>(&self, token: &str, f: impl FnOnce(&mut StudentSession) -> R) -> Option<R> {
        let now = Instant::now();
        let mut slots = self.lock();

        match slots.get_mut(token) {
            Some(slot) if slot.expires_at > now => {
                slot.expires_at = now + self.ttl;
                Some(f(&mut slot.session))
            }
            Some(_) => {
                slots.remove(token);
                None
            }
            None => None,
        }
    }

    /// Stores a new attempt, replacing any unfinished one. Reuses `token` when
    /// it names a live session, otherwise opens a new session. Returns the token.
    pub fn begin_attempt(&self, token: Option<&str>, attempt: Attempt) -> String {
        if let Some(existing) = token {
            let mut attempt = Some(attempt);
            let reused = self.with_live(existing, |session| session.attempt = attempt.take());
            if reused.is_some() {
                return existing.to_string();
            }
            return self.open(StudentSession {
                attempt,
                ..StudentSession::default()
            });
        }

        self.open(StudentSession {
            attempt: Some(attempt),
            ..StudentSession::default()
        })
    }

    fn open(&self, session: StudentSession) -> String {
        let token = Uuid::new_v4().to_string();
        let now = Instant::now();

        let mut slots = self.lock();
        slots.retain(|_, slot| slot.expires_at > now);
        slots.insert(
            token.clone(),
            Slot {
                session,
                expires_at: now + self.ttl,
            },
        );

        token
    }

    pub fn session(&self, token: &str) -> Option<StudentSession> {
        self.with_live(token, |session| session.clone())
    }

    pub fn attempt(&self, token: &str) -> Option<Attempt> {
        self.with_live(token, |session| session.attempt.clone()).flatten()
    }

    /// Removes and returns the live attempt. A second call gets `None`.
    pub fn take_attempt(&self, token: &str) -> Option<Attempt> {
        self.with_live(token, |session| session.attempt.take()).flatten()
    }

    /// Puts back an attempt whose submission could not be recorded. A session
    /// that meanwhile started another attempt keeps the newer one.
    pub fn restore_attempt(&self, token: &str, attempt: Attempt) -> bool {
        self.with_live(token, |session| {
            if session.attempt.is_none() {
                session.attempt = Some(attempt);
                true
            } else {
                false
            }
        })
        .unwrap_or(false)
    }

    /// Records the name of a finished submission and clears any review left
    /// over from an earlier one.
    pub fn finish_attempt(&self, token: &str, student_name: &str) {
        let found = self.with_live(token, |session| {
            session.last_result_name = Some(student_name.to_string());
            session.pending_review = None;
        });
        if found.is_none() {
            tracing::warn!("Session vanished before its result could be recorded");
        }
    }

    /// Parks a review on a live session. Returns `false` if the session is gone.
    pub fn set_pending_review(&self, token: &str, review: PendingReview) -> bool {
        self.with_live(token, |session| session.pending_review = Some(review))
            .is_some()
    }

    pub fn peek_pending_review(&self, token: &str) -> Option<PendingReview> {
        self.with_live(token, |session| session.pending_review.clone()).flatten()
    }

    /// Pops the pending review so a second visit finds nothing.
    pub fn take_pending_review(&self, token: &str) -> Option<PendingReview> {
        self.with_live(token, |session| session.pending_review.take()).flatten()
    }

    /// Drops expired sessions. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut slots = self.lock();
        let before = slots.len();
        slots.retain(|_, slot| slot.expires_at > now);
        before - slots.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn attempt(quiz_id: &str) -> Attempt {
        Attempt {
            quiz_id: quiz_id.to_string(),
            student_name: "ann".to_string(),
            start_time: Utc::now(),
            question_order: vec![2, 0, 1],
        }
    }

    #[test]
    fn test_take_attempt_only_once() {
        let store = SessionStore::new(Duration::from_secs(60));
        let token = store.begin_attempt(None, attempt("q"));

        assert_eq!(store.attempt(&token).unwrap().question_order, vec![2, 0, 1]);
        assert!(store.take_attempt(&token).is_some());
        assert!(store.take_attempt(&token).is_none());
        assert!(store.attempt(&token).is_none());
    }

    #[test]
    fn test_begin_reuses_live_token_and_keeps_review() {
        let store = SessionStore::new(Duration::from_secs(60));
        let token = store.begin_attempt(None, attempt("q1"));
        store.take_attempt(&token);
        let review = PendingReview {
            quiz_id: "q1".to_string(),
            handoff_token: "h".to_string(),
        };
        store.finish_attempt(&token, "ann");
        store.set_pending_review(&token, review.clone());

        let again = store.begin_attempt(Some(&token), attempt("q2"));
        assert_eq!(again, token);
        assert_eq!(store.attempt(&token).unwrap().quiz_id, "q2");
        assert_eq!(store.peek_pending_review(&token), Some(review));
    }

    #[test]
    fn test_unknown_token_opens_new_session() {
        let store = SessionStore::new(Duration::from_secs(60));
        let token = store.begin_attempt(Some("stale"), attempt("q"));

        assert_ne!(token, "stale");
        assert!(store.attempt(&token).is_some());
    }

    #[test]
    fn test_pending_review_pops_once() {
        let store = SessionStore::new(Duration::from_secs(60));
        let token = store.begin_attempt(None, attempt("q"));
        store.finish_attempt(&token, "ann");
        store.set_pending_review(
            &token,
            PendingReview {
                quiz_id: "q".to_string(),
                handoff_token: "h".to_string(),
            },
        );

        assert!(store.take_pending_review(&token).is_some());
        assert!(store.take_pending_review(&token).is_none());
        assert_eq!(
            store.session(&token).unwrap().last_result_name.as_deref(),
            Some("ann")
        );
    }

    #[test]
    fn test_set_pending_review_needs_live_session() {
        let store = SessionStore::new(Duration::from_secs(60));
        let token = store.begin_attempt(None, attempt("q"));
        let review = PendingReview {
            quiz_id: "q".to_string(),
            handoff_token: "h".to_string(),
        };

        assert!(store.set_pending_review(&token, review.clone()));
        assert!(!store.set_pending_review("unknown", review));
        assert!(store.peek_pending_review(&token).is_some());
    }

    #[test]
    fn test_restore_only_fills_an_empty_slot() {
        let store = SessionStore::new(Duration::from_secs(60));
        let token = store.begin_attempt(None, attempt("q1"));
        let taken = store.take_attempt(&token).unwrap();

        assert!(store.restore_attempt(&token, taken.clone()));
        assert_eq!(store.attempt(&token).unwrap().quiz_id, "q1");

        store.begin_attempt(Some(&token), attempt("q2"));
        assert!(!store.restore_attempt(&token, taken));
        assert_eq!(store.attempt(&token).unwrap().quiz_id, "q2");
    }

    #[test]
    fn test_finish_clears_an_old_review() {
        let store = SessionStore::new(Duration::from_secs(60));
        let token = store.begin_attempt(None, attempt("q"));
        store.set_pending_review(
            &token,
            PendingReview {
                quiz_id: "old".to_string(),
                handoff_token: "h".to_string(),
            },
        );

        store.finish_attempt(&token, "ann");

        assert!(store.peek_pending_review(&token).is_none());
    }

    #[test]
    fn test_expired_session_is_gone() {
        let store = SessionStore::new(Duration::ZERO);
        let token = store.begin_attempt(None, attempt("q"));

        assert!(store.attempt(&token).is_none());
        assert!(store.is_empty());
    }
}
