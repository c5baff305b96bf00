use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Hex HMAC-SHA256 of `"{order_id}|{payment_id}"`, as the checkout provider signs it.
pub fn payment_signature(secret: &str, order_id: &str, payment_id: &str) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time check of a hex signature. Malformed hex never matches.
pub fn verify_payment_signature(
    secret: &str,
    order_id: &str,
    payment_id: &str,
    signature: &str,
) -> bool {
    let Ok(supplied) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    mac.verify_slice(&supplied).is_ok()
}

/// Stored form of an applicant password, salted with the user id.
pub fn password_digest(user_id: &str, raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(user_id.as_bytes());
    hasher.update(b":");
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}
