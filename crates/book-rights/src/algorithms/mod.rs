//! # Algorithms
//!
//! Field codec and lock state transitions.

pub mod field_codec;
pub mod transitions;

pub use field_codec::{
    associated_data, decode_distribution_window, decode_pricing_tier, decode_sensitive,
    encode_sensitive, encode_value, parse_sensitive, validate_draft, SensitiveValue,
    CODEC_VERSION,
};
pub use transitions::{begin_unlock, complete_unlock, fail_unlock, Transition, TransitionOutcome};
