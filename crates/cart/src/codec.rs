//! Encoding of the cart payload.
//!
//! The whole cart is stored as one JSON array of line objects:
//!
//! ```json
//! [{"id":"p1","title":"Shirt","image_url":"u","price":10,"quantity":1}]
//! ```
//!
//! Decoding is strict in [`decode`]. Startup goes through [`decode_or_empty`],
//! which treats a missing, blank, `null` or malformed payload as an empty
//! cart instead of failing.

use go_marketplace_core::CartItem;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors encoding or decoding a cart payload.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Failed to encode cart: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("Malformed cart payload: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Encode a cart sequence.
///
/// # Errors
///
/// Returns `CodecError::Encode` if serialization fails.
pub fn encode(items: &[CartItem]) -> Result<String, CodecError> {
    serde_json::to_string(items).map_err(CodecError::Encode)
}

/// Decode a cart sequence.
///
/// A JSON `null` decodes to an empty cart.
///
/// # Errors
///
/// Returns `CodecError::Decode` if the payload is not a JSON array of cart
/// lines.
pub fn decode(payload: &str) -> Result<Vec<CartItem>, CodecError> {
    serde_json::from_str::<Option<Vec<CartItem>>>(payload)
        .map(Option::unwrap_or_default)
        .map_err(CodecError::Decode)
}

/// Decode a stored payload, falling back to an empty cart.
#[must_use]
pub fn decode_or_empty(payload: Option<&str>) -> Vec<CartItem> {
    let Some(payload) = payload.filter(|p| !p.trim().is_empty()) else {
        debug!("No stored cart, starting empty");
        return Vec::new();
    };

    match decode(payload) {
        Ok(items) => items,
        Err(e) => {
            warn!(error = %e, bytes = payload.len(), "Discarding unreadable stored cart");
            Vec::new()
        }
    }
}
