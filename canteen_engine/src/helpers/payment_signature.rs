//! Verification of the payment gateway's completion signature.
//!
//! When a checkout completes, the gateway hands the client a signature over `"{order_id}|{payment_id}"`, keyed with
//! the merchant's API secret (HMAC-SHA256, lowercase hex). Only the gateway and this server know the secret, so a
//! matching signature proves the payment completion came from the gateway.

use hmac::{digest::InvalidLength, Hmac, Mac};
use log::*;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Length of a hex-encoded SHA-256 MAC
const SIGNATURE_HEX_LENGTH: usize = 64;

pub struct PaymentSignature;

impl PaymentSignature {
    /// The exact byte string the gateway signs
    pub fn message(order_id: &str, payment_id: &str) -> String {
        format!("{order_id}|{payment_id}")
    }

    /// Computes the lowercase hex signature for the given gateway order and payment ids.
    pub fn compute(order_id: &str, payment_id: &str, secret: &str) -> Result<String, InvalidLength> {
        let mac = keyed_mac(order_id, payment_id, secret)?;
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Returns true only if `claimed` is exactly the lowercase hex signature of `order_id|payment_id`.
    ///
    /// The MAC comparison is constant time.
    pub fn verify(order_id: &str, payment_id: &str, claimed: &str, secret: &str) -> bool {
        if !is_lower_hex(claimed) {
            debug!("🔐️ Payment signature for {payment_id} is not a lowercase hex SHA-256 MAC");
            return false;
        }
        let Ok(claimed_bytes) = hex::decode(claimed) else {
            return false;
        };
        match keyed_mac(order_id, payment_id, secret) {
            Ok(mac) => mac.verify_slice(&claimed_bytes).is_ok(),
            Err(e) => {
                error!("🔐️ Could not initialise the payment signature MAC. {e}");
                false
            },
        }
    }
}

fn keyed_mac(order_id: &str, payment_id: &str, secret: &str) -> Result<HmacSha256, InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())?;
    mac.update(PaymentSignature::message(order_id, payment_id).as_bytes());
    Ok(mac)
}

fn is_lower_hex(s: &str) -> bool {
    s.len() == SIGNATURE_HEX_LENGTH && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
