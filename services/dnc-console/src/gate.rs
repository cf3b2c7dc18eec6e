//! Confirmation gate: explicit user confirmation before a mutating action
//!
//! `Idle -> AwaitingConfirmation -> (Confirmed | Cancelled) -> Idle`. At most
//! one action waits at a time; a second request while one is pending is a
//! usage error reported to the caller.

use std::fmt;

use async_trait::async_trait;
use rand::Rng;

use crate::record::RowKey;

const CHALLENGE_LENGTH: usize = 5;

/// The mutating operation waiting behind the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Update,
    Append,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Update => write!(f, "update"),
            Operation::Append => write!(f, "append"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}

/// What the user is shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    /// Cancel / Confirm
    Simple { title: String, message: String },
    /// The code must be typed back before the action runs
    Challenge {
        title: String,
        message: String,
        code: String,
    },
}

impl Prompt {
    pub fn simple(title: impl Into<String>, message: impl Into<String>) -> Self {
        Prompt::Simple {
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn challenge(title: impl Into<String>, message: impl Into<String>) -> Self {
        Prompt::Challenge {
            title: title.into(),
            message: message.into(),
            code: random_code(),
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Prompt::Simple { title, .. } | Prompt::Challenge { title, .. } => title,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Prompt::Simple { message, .. } | Prompt::Challenge { message, .. } => message,
        }
    }

    /// The code a challenge expects, if this is one
    pub fn challenge_code(&self) -> Option<&str> {
        match self {
            Prompt::Challenge { code, .. } => Some(code),
            Prompt::Simple { .. } => None,
        }
    }
}

fn random_code() -> String {
    // No 0/O or 1/I: the code is read off a screen and retyped.
    const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
    let mut rng = rand::rng();
    (0..CHALLENGE_LENGTH)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

/// The user's answer to a prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Confirm,
    Cancel,
    Solve(String),
}

/// An action waiting for confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAction {
    pub operation: Operation,
    pub key: RowKey,
    pub prompt: Prompt,
}

/// Result of resolving the gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Confirmed(PendingAction),
    Cancelled(PendingAction),
}

#[derive(Debug, Default)]
pub struct ConfirmationGate {
    pending: Option<PendingAction>,
}

impl ConfirmationGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_none()
    }

    pub fn pending(&self) -> Option<&PendingAction> {
        self.pending.as_ref()
    }

    /// Move to awaiting confirmation; fails if something is already waiting
    pub fn request(
        &mut self,
        operation: Operation,
        key: RowKey,
        prompt: Prompt,
    ) -> crate::Result<&Prompt> {
        if self.pending.is_some() {
            return Err(crate::DncError::GateBusy);
        }
        tracing::debug!("Gate awaiting confirmation to {} row {}", operation, key.id);
        let pending = self.pending.insert(PendingAction {
            operation,
            key,
            prompt,
        });
        Ok(&pending.prompt)
    }

    /// Apply the user's answer. A wrong challenge answer leaves the action
    /// pending so the user can retry or cancel.
    pub fn resolve(&mut self, response: Response) -> crate::Result<Decision> {
        let pending = self.pending.as_ref().ok_or(crate::DncError::NoPendingAction)?;

        let confirmed = match (&pending.prompt, &response) {
            (_, Response::Cancel) => false,
            (Prompt::Simple { .. }, Response::Confirm) => true,
            (Prompt::Challenge { code, .. }, Response::Solve(answer)) => {
                if answer.trim().eq_ignore_ascii_case(code) {
                    true
                } else {
                    tracing::debug!("Challenge answer rejected for row {}", pending.key.id);
                    return Err(crate::DncError::ChallengeFailed);
                }
            }
            (Prompt::Challenge { .. }, Response::Confirm) => {
                return Err(crate::DncError::ChallengeFailed);
            }
            (Prompt::Simple { .. }, Response::Solve(_)) => true,
        };

        let Some(action) = self.pending.take() else {
            return Err(crate::DncError::NoPendingAction);
        };
        if confirmed {
            tracing::debug!("Confirmed {} of row {}", action.operation, action.key.id);
            Ok(Decision::Confirmed(action))
        } else {
            tracing::debug!("Cancelled {} of row {}", action.operation, action.key.id);
            Ok(Decision::Cancelled(action))
        }
    }

    /// Drop whatever is pending without running it
    pub fn reset(&mut self) -> Option<PendingAction> {
        self.pending.take()
    }
}

/// Interactive source of answers to prompts
#[async_trait]
pub trait Confirmer: Send + Sync {
    async fn confirm(&self, prompt: &Prompt) -> crate::Result<Response>;
}

/// Answers every prompt affirmatively, solving challenges; used for `--yes`
#[derive(Debug, Default)]
pub struct AutoConfirmer;

#[async_trait]
impl Confirmer for AutoConfirmer {
    async fn confirm(&self, prompt: &Prompt) -> crate::Result<Response> {
        Ok(match prompt.challenge_code() {
            Some(code) => Response::Solve(code.to_string()),
            None => Response::Confirm,
        })
    }
}
