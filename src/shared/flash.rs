//! One-shot flash messages carried in a signed cookie.
//!
//! The message is set on a redirect and consumed by the next page render.
//! The cookie value is `base64url(message) "." hex(hmac_sha256(secret, message))`,
//! so a client cannot inject arbitrary text into the rendered page.

use axum::http::{header, HeaderMap};
use base64::prelude::*;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::core::error::AppError;
use crate::shared::constants::FLASH_COOKIE_NAME;

type HmacSha256 = Hmac<Sha256>;

fn mac_for(secret: &str) -> Result<HmacSha256, AppError> {
    HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(format!("HMAC key error: {}", e)))
}

/// Sign a message into a cookie value
pub fn encode(secret: &str, message: &str) -> Result<String, AppError> {
    let mut mac = mac_for(secret)?;
    mac.update(message.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    Ok(format!(
        "{}.{}",
        BASE64_URL_SAFE_NO_PAD.encode(message.as_bytes()),
        signature
    ))
}

/// Verify and unpack a cookie value; `None` when tampered or malformed
pub fn decode(secret: &str, value: &str) -> Option<String> {
    let (payload, signature) = value.split_once('.')?;
    let message = String::from_utf8(BASE64_URL_SAFE_NO_PAD.decode(payload).ok()?).ok()?;
    let signature = hex::decode(signature).ok()?;

    let mut mac = mac_for(secret).ok()?;
    mac.update(message.as_bytes());
    mac.verify_slice(&signature).ok()?;

    Some(message)
}

/// `Set-Cookie` value that stores a flash message
pub fn set_cookie(secret: &str, message: &str) -> Result<String, AppError> {
    Ok(format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        FLASH_COOKIE_NAME,
        encode(secret, message)?
    ))
}

/// `Set-Cookie` value that removes the flash cookie
pub fn clear_cookie() -> String {
    format!(
        "{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax",
        FLASH_COOKIE_NAME
    )
}

/// Extract and verify the flash message from request cookies
pub fn take_from_headers(headers: &HeaderMap, secret: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == FLASH_COOKIE_NAME)
        .and_then(|(_, value)| decode(secret, value))
}
