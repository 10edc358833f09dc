// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 PhishGuard

//! # API Data Models
//!
//! Domain models and wire DTOs used by the client surface. All types derive
//! `Serialize`/`Deserialize` for JSON handling.
//!
//! ## Id Newtypes
//!
//! [`ModuleId`] and [`ScenarioId`] wrap the server's integer identifiers.
//! They provide type safety and keep the two id spaces from mixing.
//!
//! ## Model Categories
//!
//! - **Catalog**: purchasable training modules
//! - **Training**: scenarios and attempt verdicts
//! - **Wallet**: credit balance and mutation responses
//! - **Assistant**: conversation turns

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::Role;

// =============================================================================
// Id Newtypes
// =============================================================================

/// Identifier of a purchasable training module.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModuleId(pub i64);

impl std::fmt::Display for ModuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ModuleId {
    fn from(value: i64) -> Self {
        ModuleId(value)
    }
}

/// Identifier of a single phishing scenario within a module.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScenarioId(pub i64);

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ScenarioId {
    fn from(value: i64) -> Self {
        ScenarioId(value)
    }
}

// =============================================================================
// Catalog Models
// =============================================================================

/// A purchasable training module.
///
/// `provider_email` is present only in the public catalog view; the
/// provider's own module listing omits it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Module {
    /// Server-assigned module id.
    pub id: ModuleId,
    /// Display title.
    pub title: String,
    /// Longer description shown on the catalog card.
    pub description: String,
    /// Price in credits (non-negative).
    pub price: u64,
    /// Authoring provider's email (catalog view only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_email: Option<String>,
}

/// Request to create a new module (provider only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateModuleRequest {
    /// Display title (must be non-blank).
    pub title: String,
    /// Longer description.
    pub description: String,
    /// Price in credits.
    pub price: u64,
}

/// Server acknowledgement carrying the id of a created entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedResponse {
    /// Id of the newly created entity.
    pub id: i64,
    /// Always true on a 2xx response.
    pub ok: bool,
}

// =============================================================================
// Training Models
// =============================================================================

/// Delivery medium of a phishing scenario.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Channel {
    /// Phishing email simulation.
    Email,
    /// Smishing (SMS) simulation.
    Sms,
    /// Web / landing-page simulation.
    Web,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::Email => write!(f, "EMAIL"),
            Channel::Sms => write!(f, "SMS"),
            Channel::Web => write!(f, "WEB"),
        }
    }
}

/// A scenario as the attempting client sees it.
///
/// The correct choice never appears here; only the server knows it and
/// returns a verdict on attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Scenario {
    /// Server-assigned scenario id.
    pub id: ScenarioId,
    /// Delivery medium.
    pub channel: Channel,
    /// The simulated message presented to the trainee.
    pub prompt: String,
}

/// Request to author a scenario within a module (provider only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScenarioRequest {
    /// Delivery medium.
    pub channel: Channel,
    /// The simulated message.
    pub prompt: String,
    /// Which choice (0 or 1) is correct. Held server-side only after upload.
    pub correct_choice: u8,
}

/// Request to submit an answer for a scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptRequest {
    /// The scenario being answered.
    pub scenario_id: ScenarioId,
    /// The trainee's choice (0 or 1).
    pub user_choice: u8,
}

/// Server-issued correctness verdict for an attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptResponse {
    /// Whether the submitted choice was correct.
    pub correct: bool,
}

// =============================================================================
// Wallet Models
// =============================================================================

/// Credit balance as last confirmed by the server.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WalletBalance {
    /// Non-negative credit count.
    pub credits: u64,
}

/// Request to add credits to the wallet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopupRequest {
    /// Amount of credits to add (must be positive; validated locally).
    pub amount: i64,
}

/// Response to a mutating wallet call (top-up or purchase).
///
/// `credits` reflects the server's authoritative post-mutation balance; the
/// client adopts it verbatim rather than doing its own arithmetic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletMutationResponse {
    /// Whether the mutation was applied.
    pub ok: bool,
    /// Authoritative balance after the mutation.
    pub credits: u64,
}

// =============================================================================
// Auth Models
// =============================================================================

/// Request to register a new account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Account email.
    pub email: String,
    /// Account password.
    pub password: String,
    /// Requested role.
    pub role: Role,
}

/// Request to sign in to an existing account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Account email.
    pub email: String,
    /// Account password.
    pub password: String,
}

/// Server response to a successful register or login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Opaque bearer credential.
    pub token: String,
    /// Role the server associated with the account.
    pub role: Role,
}

// =============================================================================
// Assistant Models
// =============================================================================

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    /// The person asking.
    User,
    /// The assistant (including fallback apologies).
    Assistant,
}

/// One message in the assistant conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationTurn {
    /// Client-assigned turn id.
    pub id: Uuid,
    /// Who produced the turn.
    pub speaker: Speaker,
    /// Message text.
    pub text: String,
    /// When the turn was appended locally.
    pub created_at: DateTime<Utc>,
}

impl ConversationTurn {
    /// Build a turn stamped with the current time.
    pub fn now(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            speaker,
            text: text.into(),
            created_at: Utc::now(),
        }
    }
}

/// Request to the assistant endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    /// The user's question, verbatim.
    pub question: String,
}

/// Assistant endpoint response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    /// The assistant's answer.
    pub answer: String,
}

// =============================================================================
// Health Models
// =============================================================================

/// Server liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Whether the server considers itself healthy.
    pub ok: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_uses_uppercase_wire_format() {
        assert_eq!(serde_json::to_string(&Channel::Email).unwrap(), "\"EMAIL\"");
        assert_eq!(serde_json::to_string(&Channel::Sms).unwrap(), "\"SMS\"");
        assert_eq!(
            serde_json::from_str::<Channel>("\"WEB\"").unwrap(),
            Channel::Web
        );
    }

    #[test]
    fn module_tolerates_missing_provider_email() {
        let json = r#"{"id":3,"title":"Spotting OTP scams","description":"d","price":10}"#;
        let module: Module = serde_json::from_str(json).unwrap();
        assert_eq!(module.id, ModuleId(3));
        assert!(module.provider_email.is_none());
    }

    #[test]
    fn speaker_uses_lowercase_wire_format() {
        assert_eq!(serde_json::to_string(&Speaker::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::from_str::<Speaker>("\"assistant\"").unwrap(),
            Speaker::Assistant
        );
    }

    #[test]
    fn conversation_turn_now_stamps_id_and_time() {
        let a = ConversationTurn::now(Speaker::User, "is this link safe?");
        let b = ConversationTurn::now(Speaker::User, "is this link safe?");
        assert_ne!(a.id, b.id);
        assert_eq!(a.text, "is this link safe?");
    }
}
