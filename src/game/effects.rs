//! Presentation requests phases hand to the host.
//!
//! Phases never play anything themselves. They append an [`EffectRequest`] to the session
//! outbox; when the request carries a gate, the host answers by settling it.

use crate::game::party::Species;
use crate::game::rewards::RewardTier;
use crate::gate::GateHandle;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Effect {
    /// Dialogue text; resolved with `Ack` once dismissed.
    Text {
        key: String,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        tokens: BTreeMap<String, String>,
    },
    /// Option menu; resolved with `Choice(index)`.
    Prompt { key: String, options: Vec<String> },
    /// Sprite or field animation; resolved with `Ack`.
    Animation { key: String },
    /// Screen fade; resolved with `Ack`.
    Fade { millis: u32 },
    /// Starter picker; resolved with `Data` holding a list of species names.
    StarterSelect { slots: usize },
    /// Daily seed lookup; resolved with `Data` holding the seed string.
    DailySeed,
    /// Battle played by the combat service; resolved with `Confirm(won)`.
    Battle {
        wave: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        boss: Option<Species>,
        double: bool,
    },
    /// Reward shop; resolved with `Choice(index)`, anything else skips.
    RewardOffer { tiers: Vec<RewardTier> },
    /// Evolution scene; resolved with `Confirm(proceed)`.
    Evolution {
        member: usize,
        from: Species,
        into: Species,
    },
}

impl Effect {
    pub fn text(key: impl Into<String>) -> Self {
        Effect::Text {
            key: key.into(),
            tokens: BTreeMap::new(),
        }
    }

    /// Attach a substitution token to a `Text` effect. Other effects are returned unchanged.
    pub fn with_token(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        if let Effect::Text { tokens, .. } = &mut self {
            tokens.insert(name.into(), value.to_string());
        }
        self
    }

    pub fn prompt(key: impl Into<String>, options: &[&str]) -> Self {
        Effect::Prompt {
            key: key.into(),
            options: options.iter().map(|option| option.to_string()).collect(),
        }
    }

    pub fn animation(key: impl Into<String>) -> Self {
        Effect::Animation { key: key.into() }
    }

    /// Short label for transcripts.
    pub fn kind(&self) -> &'static str {
        match self {
            Effect::Text { .. } => "text",
            Effect::Prompt { .. } => "prompt",
            Effect::Animation { .. } => "animation",
            Effect::Fade { .. } => "fade",
            Effect::StarterSelect { .. } => "starter_select",
            Effect::DailySeed => "daily_seed",
            Effect::Battle { .. } => "battle",
            Effect::RewardOffer { .. } => "reward_offer",
            Effect::Evolution { .. } => "evolution",
        }
    }
}

/// An effect plus the gate the host settles when it is done, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectRequest {
    pub gate: Option<GateHandle>,
    pub effect: Effect,
}
