//! Mutation policies.
//!
//! The defaults reproduce the plain behavior of the cart: `addToCart` always
//! appends a new line and `decrement` has no floor. Both can be tightened.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// What `decrement` does when a quantity would drop below one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DecrementPolicy {
    /// Subtract one unconditionally; quantities may become negative.
    #[default]
    Unclamped,
    /// Never go below zero; the line stays in the cart with quantity zero.
    ClampAtZero,
    /// Remove the line once its quantity reaches zero.
    RemoveAtZero,
}

/// What `addToCart` does when the product is already in the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DuplicatePolicy {
    /// Append another line with quantity one.
    #[default]
    Append,
    /// Increment the existing line instead of appending.
    MergeQuantity,
}

/// Combined cart mutation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CartPolicy {
    pub decrement: DecrementPolicy,
    pub duplicate: DuplicatePolicy,
}

/// Error parsing a policy name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {kind} policy '{value}' (expected one of: {expected})")]
pub struct ParsePolicyError {
    kind: &'static str,
    value: String,
    expected: &'static str,
}

impl FromStr for DecrementPolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unclamped" | "none" => Ok(Self::Unclamped),
            "clamp" | "clamp_at_zero" => Ok(Self::ClampAtZero),
            "remove" | "remove_at_zero" => Ok(Self::RemoveAtZero),
            _ => Err(ParsePolicyError {
                kind: "decrement",
                value: s.to_string(),
                expected: "unclamped, clamp, remove",
            }),
        }
    }
}

impl FromStr for DuplicatePolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "append" => Ok(Self::Append),
            "merge" | "merge_quantity" => Ok(Self::MergeQuantity),
            _ => Err(ParsePolicyError {
                kind: "duplicate",
                value: s.to_string(),
                expected: "append, merge",
            }),
        }
    }
}

impl fmt::Display for DecrementPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unclamped => "unclamped",
            Self::ClampAtZero => "clamp",
            Self::RemoveAtZero => "remove",
        })
    }
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Append => "append",
            Self::MergeQuantity => "merge",
        })
    }
}
