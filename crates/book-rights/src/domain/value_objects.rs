//! # Domain Value Objects
//!
//! Immutable value types for book rights: identifiers, the closed option
//! sets a publisher picks from, and the per-record lock state.

use super::errors::CodecError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Registry-assigned book identifier.
///
/// Opaque to the client. Only the registry mints these.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BookId(String);

impl BookId {
    /// Wrap a registry-issued identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BookId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Pricing tier (sensitive).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PricingTier {
    /// $9.99
    Premium,
    /// $4.99
    Standard,
    /// $2.99
    Basic,
}

impl PricingTier {
    /// Every tier, in presentation order.
    pub const ALL: [PricingTier; 3] = [Self::Premium, Self::Standard, Self::Basic];

    /// Human-readable option label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Premium => "Premium - $9.99",
            Self::Standard => "Standard - $4.99",
            Self::Basic => "Basic - $2.99",
        }
    }

    /// Wire code used by the field codec.
    pub fn code(&self) -> u8 {
        match self {
            Self::Premium => 1,
            Self::Standard => 2,
            Self::Basic => 3,
        }
    }

    /// Inverse of [`PricingTier::code`].
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|tier| tier.code() == code)
    }

    /// Parse an option label.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tier| tier.label() == label)
    }
}

/// Distribution window (sensitive).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DistributionWindow {
    /// 6 months exclusive.
    Exclusive,
    /// 3 months limited.
    Limited,
    /// No restriction.
    Open,
}

impl DistributionWindow {
    /// Every window, in presentation order.
    pub const ALL: [DistributionWindow; 3] = [Self::Exclusive, Self::Limited, Self::Open];

    /// Human-readable option label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Exclusive => "Exclusive - 6 months",
            Self::Limited => "Limited - 3 months",
            Self::Open => "Open - Unlimited",
        }
    }

    /// Wire code used by the field codec.
    pub fn code(&self) -> u8 {
        match self {
            Self::Exclusive => 1,
            Self::Limited => 2,
            Self::Open => 3,
        }
    }

    /// Inverse of [`DistributionWindow::code`].
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|window| window.code() == code)
    }

    /// Parse an option label.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|window| window.label() == label)
    }
}

/// Book genre (public metadata).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Genre {
    /// Fiction.
    Fiction,
    /// Non-Fiction.
    NonFiction,
    /// Science.
    Science,
    /// Technology.
    Technology,
    /// Business.
    Business,
    /// Self-Help.
    SelfHelp,
}

impl Genre {
    /// Every genre, in presentation order.
    pub const ALL: [Genre; 6] = [
        Self::Fiction,
        Self::NonFiction,
        Self::Science,
        Self::Technology,
        Self::Business,
        Self::SelfHelp,
    ];

    /// Display label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Fiction => "Fiction",
            Self::NonFiction => "Non-Fiction",
            Self::Science => "Science",
            Self::Technology => "Technology",
            Self::Business => "Business",
            Self::SelfHelp => "Self-Help",
        }
    }

    /// Parse a display label.
    pub fn parse(label: &str) -> Result<Self, CodecError> {
        Self::ALL
            .into_iter()
            .find(|genre| genre.label() == label)
            .ok_or_else(|| CodecError::UnknownGenre(label.to_string()))
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which sensitive field a value or ciphertext belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensitiveFieldKind {
    /// [`PricingTier`]
    PricingTier,
    /// [`DistributionWindow`]
    DistributionWindow,
}

impl SensitiveFieldKind {
    /// Field tag byte in the codec wire form.
    pub fn tag(&self) -> u8 {
        match self {
            Self::PricingTier => 0x01,
            Self::DistributionWindow => 0x02,
        }
    }

    /// Inverse of [`SensitiveFieldKind::tag`].
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0x01 => Some(Self::PricingTier),
            0x02 => Some(Self::DistributionWindow),
            _ => None,
        }
    }

    /// Field name used in logs and associated data.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PricingTier => "pricing_tier",
            Self::DistributionWindow => "distribution_window",
        }
    }
}

/// Disclosure status of a registered record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LockState {
    /// Sensitive fields hold ciphertext.
    #[default]
    Locked,
    /// A decryption request is in flight. Never persisted.
    Unlocking,
    /// Sensitive fields hold plaintext.
    Unlocked,
}

impl LockState {
    /// Check if transition is valid.
    ///
    /// `Locked → Unlocking → {Unlocked | Locked}`. Nothing leaves `Unlocked`.
    pub fn can_transition_to(&self, next: LockState) -> bool {
        matches!(
            (self, next),
            (Self::Locked, Self::Unlocking)
                | (Self::Unlocking, Self::Unlocked)
                | (Self::Unlocking, Self::Locked)
        )
    }

    /// Whether sensitive fields must be ciphertext in this state.
    pub fn holds_ciphertext(&self) -> bool {
        !matches!(self, Self::Unlocked)
    }
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Locked => "Locked",
            Self::Unlocking => "Unlocking",
            Self::Unlocked => "Unlocked",
        };
        f.write_str(name)
    }
}
