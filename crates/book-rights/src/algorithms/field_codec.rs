//! # Field Codec
//!
//! Converts sensitive option labels to and from the byte form that gets
//! sealed.
//!
//! Wire form: `[version, field tag, option code]`. The tag makes a pricing
//! tier ciphertext impossible to decode as a distribution window.

use crate::domain::{
    BookDraft, BookMetadata, CodecError, CodecInput, DistributionWindow, Genre, PricingTier,
    SensitiveFieldKind, ValidatedDraft,
};

/// Current wire version.
pub const CODEC_VERSION: u8 = 1;

/// Encoded length of every sensitive value.
pub const ENCODED_LEN: usize = 3;

/// Domain prefix of per-field associated data.
const AAD_DOMAIN: &[u8] = b"book-rights/field/v1";

/// A decoded sensitive value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SensitiveValue {
    /// Pricing tier.
    PricingTier(PricingTier),
    /// Distribution window.
    DistributionWindow(DistributionWindow),
}

impl SensitiveValue {
    /// Field this value belongs to.
    pub fn kind(&self) -> SensitiveFieldKind {
        match self {
            Self::PricingTier(_) => SensitiveFieldKind::PricingTier,
            Self::DistributionWindow(_) => SensitiveFieldKind::DistributionWindow,
        }
    }

    /// Option label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::PricingTier(tier) => tier.label(),
            Self::DistributionWindow(window) => window.label(),
        }
    }

    fn code(&self) -> u8 {
        match self {
            Self::PricingTier(tier) => tier.code(),
            Self::DistributionWindow(window) => window.code(),
        }
    }
}

/// Parse `label` as an option of `kind`.
pub fn parse_sensitive(
    kind: SensitiveFieldKind,
    label: &str,
) -> Result<SensitiveValue, CodecError> {
    let value = match kind {
        SensitiveFieldKind::PricingTier => {
            PricingTier::from_label(label).map(SensitiveValue::PricingTier)
        }
        SensitiveFieldKind::DistributionWindow => {
            DistributionWindow::from_label(label).map(SensitiveValue::DistributionWindow)
        }
    };
    value.ok_or(CodecError::UnknownOption { field: kind.name() })
}

/// Encode a typed value.
pub fn encode_value(value: SensitiveValue) -> CodecInput {
    CodecInput::new(vec![CODEC_VERSION, value.kind().tag(), value.code()])
}

/// Encode an option label of `kind`.
pub fn encode_sensitive(kind: SensitiveFieldKind, label: &str) -> Result<CodecInput, CodecError> {
    parse_sensitive(kind, label).map(encode_value)
}

/// Decode wire bytes, requiring them to belong to `expected`.
pub fn decode_sensitive(
    expected: SensitiveFieldKind,
    bytes: &[u8],
) -> Result<SensitiveValue, CodecError> {
    let [version, tag, code]: [u8; ENCODED_LEN] =
        bytes.try_into().map_err(|_| CodecError::Malformed {
            expected: ENCODED_LEN,
            actual: bytes.len(),
        })?;

    if version != CODEC_VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }

    let kind = SensitiveFieldKind::from_tag(tag).ok_or(CodecError::UnknownFieldTag(tag))?;
    if kind != expected {
        return Err(CodecError::FieldMismatch {
            expected: expected.name(),
            actual: kind.name(),
        });
    }

    let value = match kind {
        SensitiveFieldKind::PricingTier => {
            PricingTier::from_code(code).map(SensitiveValue::PricingTier)
        }
        SensitiveFieldKind::DistributionWindow => {
            DistributionWindow::from_code(code).map(SensitiveValue::DistributionWindow)
        }
    };
    value.ok_or(CodecError::UnknownCode {
        field: kind.name(),
        code,
    })
}

/// Decode a pricing tier.
pub fn decode_pricing_tier(bytes: &[u8]) -> Result<PricingTier, CodecError> {
    match decode_sensitive(SensitiveFieldKind::PricingTier, bytes)? {
        SensitiveValue::PricingTier(tier) => Ok(tier),
        SensitiveValue::DistributionWindow(_) => Err(CodecError::FieldMismatch {
            expected: SensitiveFieldKind::PricingTier.name(),
            actual: SensitiveFieldKind::DistributionWindow.name(),
        }),
    }
}

/// Decode a distribution window.
pub fn decode_distribution_window(bytes: &[u8]) -> Result<DistributionWindow, CodecError> {
    match decode_sensitive(SensitiveFieldKind::DistributionWindow, bytes)? {
        SensitiveValue::DistributionWindow(window) => Ok(window),
        SensitiveValue::PricingTier(_) => Err(CodecError::FieldMismatch {
            expected: SensitiveFieldKind::DistributionWindow.name(),
            actual: SensitiveFieldKind::PricingTier.name(),
        }),
    }
}

/// Validate every draft field.
///
/// Metadata must be non-blank, the genre must be a known genre and both
/// sensitive fields must be recognized options.
pub fn validate_draft(draft: &BookDraft) -> Result<ValidatedDraft, CodecError> {
    for (name, value) in [
        ("title", &draft.title),
        ("author", &draft.author),
        ("publisher", &draft.publisher),
    ] {
        if value.trim().is_empty() {
            return Err(CodecError::MissingField(name));
        }
    }

    let genre = Genre::parse(&draft.genre)?;
    let pricing_tier = PricingTier::from_label(&draft.pricing_tier).ok_or(
        CodecError::UnknownOption {
            field: SensitiveFieldKind::PricingTier.name(),
        },
    )?;
    let distribution_window = DistributionWindow::from_label(&draft.distribution_window).ok_or(
        CodecError::UnknownOption {
            field: SensitiveFieldKind::DistributionWindow.name(),
        },
    )?;

    Ok(ValidatedDraft {
        metadata: BookMetadata {
            title: draft.title.clone(),
            author: draft.author.clone(),
            publisher: draft.publisher.clone(),
            genre,
        },
        pricing_tier,
        distribution_window,
    })
}

/// Associated data sealed alongside a field: binds the ciphertext to its
/// field and to the record's public metadata.
pub fn associated_data(
    kind: SensitiveFieldKind,
    metadata: &BookMetadata,
) -> Result<Vec<u8>, CodecError> {
    let metadata_bytes = metadata.canonical_bytes()?;
    let mut aad = Vec::with_capacity(AAD_DOMAIN.len() + 1 + metadata_bytes.len());
    aad.extend_from_slice(AAD_DOMAIN);
    aad.push(kind.tag());
    aad.extend_from_slice(&metadata_bytes);
    Ok(aad)
}
