// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 PhishGuard

//! Conversational assistant with an append-only turn history.
//!
//! The conversation is the single source of record for both successes and
//! failures: a failed exchange appends a fallback assistant turn instead of
//! removing the user turn or raising an alert. Turns are never truncated or
//! rewritten.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::warn;

use crate::dispatch::Dispatcher;
use crate::models::{AskRequest, AskResponse, ConversationTurn, Speaker};

/// Opening assistant turn seeded at construction.
const GREETING: &str = "Hi! I'm your PhishGuard assistant. Ask me about phishing red flags, suspicious links, OTP scams, and more.";

/// In-band reply appended when an exchange fails.
const FALLBACK_ANSWER: &str = "Sorry, couldn't reach the AI right now. Please try again.";

/// Turn-based exchange with the assistant endpoint.
///
/// Exactly one request is in flight at a time per conversation; an `ask`
/// while one is pending is a no-op.
pub struct AssistantClient {
    dispatcher: Arc<Dispatcher>,
    turns: Mutex<Vec<ConversationTurn>>,
    in_flight: AtomicBool,
}

impl AssistantClient {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            turns: Mutex::new(vec![ConversationTurn::now(Speaker::Assistant, GREETING)]),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Snapshot of the conversation so far.
    pub fn turns(&self) -> Vec<ConversationTurn> {
        self.lock().clone()
    }

    /// Ask a question.
    ///
    /// A blank question, or a call while an exchange is already in flight,
    /// is a no-op returning `false`. Otherwise the user turn is appended
    /// synchronously before the request resolves, and exactly one assistant
    /// turn (answer or fallback) follows it. Returns `true` when an
    /// exchange was appended.
    pub async fn ask(&self, question: &str) -> bool {
        let question = question.trim();
        if question.is_empty() {
            return false;
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }

        // Optimistic: the user's turn is on record before the network call.
        self.append(ConversationTurn::now(Speaker::User, question));

        let answer = match self
            .dispatcher
            .post::<AskResponse, _>(
                "/ai/ask",
                &AskRequest {
                    question: question.to_string(),
                },
            )
            .await
        {
            Ok(response) => response.answer,
            Err(e) => {
                warn!(error = %e, "assistant exchange failed; appending fallback turn");
                FALLBACK_ANSWER.to_string()
            }
        };

        self.append(ConversationTurn::now(Speaker::Assistant, answer));
        self.in_flight.store(false, Ordering::SeqCst);
        true
    }

    fn append(&self, turn: ConversationTurn) {
        self.lock().push(turn);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ConversationTurn>> {
        self.turns.lock().unwrap_or_else(|poison| poison.into_inner())
    }
}
