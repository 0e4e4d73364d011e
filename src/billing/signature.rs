// ABOUTME: Webhook signature verification for payment gateway callbacks
// ABOUTME: HMAC-SHA256 over the timestamped payload with constant-time comparison
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 FitFlow

use crate::errors::{AppError, AppResult};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Maximum accepted age of a signed webhook, in seconds
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Parsed `Stripe-Signature` header
#[derive(Debug, Clone)]
pub struct SignatureHeader {
    /// Unix timestamp the sender signed
    pub timestamp: i64,
    /// Hex-encoded v1 signatures (there may be several during secret rotation)
    pub signatures: Vec<String>,
}

/// Parse a `t=...,v1=...` signature header.
///
/// # Errors
///
/// Returns an error when the timestamp or every v1 signature is missing.
pub fn parse_signature_header(header: &str) -> AppResult<SignatureHeader> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => {
                timestamp = value.parse::<i64>().ok();
            }
            "v1" => signatures.push(value.to_owned()),
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| AppError::invalid_input("Signature header missing timestamp"))?;
    if signatures.is_empty() {
        return Err(AppError::invalid_input("Signature header missing v1 signature"));
    }

    Ok(SignatureHeader { timestamp, signatures })
}

/// Compute the expected hex signature for a payload at a given timestamp
fn expected_signature(secret: &str, timestamp: i64, payload: &str) -> AppResult<String> {
    let signed_payload = format!("{timestamp}.{payload}");
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::internal(format!("Invalid webhook secret: {e}")))?;
    mac.update(signed_payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verify a webhook payload against its signature header.
///
/// Rejects signatures older than the replay tolerance and compares the
/// HMAC in constant time.
///
/// # Errors
///
/// Returns an error for a malformed header, an expired timestamp, or a
/// signature mismatch.
pub fn verify_signature(
    payload: &str,
    header: &str,
    secret: &str,
    now_unix: i64,
) -> AppResult<()> {
    let parsed = parse_signature_header(header)?;

    if (now_unix - parsed.timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(AppError::auth_invalid("Webhook signature timestamp outside tolerance"));
    }

    let expected = expected_signature(secret, parsed.timestamp, payload)?;
    let matches = parsed.signatures.iter().any(|candidate| {
        candidate.as_bytes().ct_eq(expected.as_bytes()).into()
    });

    if matches {
        Ok(())
    } else {
        Err(AppError::auth_invalid("Webhook signature mismatch"))
    }
}
