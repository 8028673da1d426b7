//! Decision Engine
//!
//! Classifies a credential header value as allowed or denied. The engine is
//! immutable after construction and holds no per-request state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Header checked by the exact-match rule
pub const CHECK_HEADER: &str = "x-ext-authz";

/// Header checked by the bearer-token rule
pub const AUTHORIZATION_HEADER: &str = "authorization";

/// Token accepted when nothing else is configured
pub const DEFAULT_ALLOW_TOKEN: &str = "allow";

const BEARER_PREFIX: &str = "Bearer ";

/// Outcome of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allowed,
    Denied,
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allowed)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Allowed => f.write_str("allowed"),
            Verdict::Denied => f.write_str("denied"),
        }
    }
}

/// How the credential header is compared against the allow token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecisionRule {
    /// Header value must equal the token exactly
    #[default]
    ExactMatch,
    /// Header value must be `Bearer <token>`
    BearerToken,
}

impl DecisionRule {
    /// Header carrying the credential for this rule (lowercase)
    pub fn credential_header(&self) -> &'static str {
        match self {
            DecisionRule::ExactMatch => CHECK_HEADER,
            DecisionRule::BearerToken => AUTHORIZATION_HEADER,
        }
    }

    /// Extract the token to compare. Never fails; anything unrecognised
    /// becomes the empty token.
    fn token<'a>(&self, credential: &'a str) -> &'a str {
        match self {
            DecisionRule::ExactMatch => credential,
            DecisionRule::BearerToken => credential.strip_prefix(BEARER_PREFIX).unwrap_or(""),
        }
    }
}

impl fmt::Display for DecisionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionRule::ExactMatch => f.write_str("exact-match"),
            DecisionRule::BearerToken => f.write_str("bearer-token"),
        }
    }
}

/// Stateless credential classifier
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    rule: DecisionRule,
    allow_token: String,
}

impl DecisionEngine {
    /// Create engine for a rule and token
    pub fn new(rule: DecisionRule, allow_token: impl Into<String>) -> Self {
        Self {
            rule,
            allow_token: allow_token.into(),
        }
    }

    /// Active rule
    pub fn rule(&self) -> DecisionRule {
        self.rule
    }

    /// Header the adapters must read the credential from
    pub fn credential_header(&self) -> &'static str {
        self.rule.credential_header()
    }

    /// Classify a credential header value. An absent header is passed as "".
    pub fn decide(&self, credential: &str) -> Verdict {
        if self.rule.token(credential) == self.allow_token {
            Verdict::Allowed
        } else {
            Verdict::Denied
        }
    }
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::new(DecisionRule::default(), DEFAULT_ALLOW_TOKEN)
    }
}
