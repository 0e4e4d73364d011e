// ABOUTME: Expiring signed URLs for exercise videos and other stored media
// ABOUTME: HMAC-SHA256 over path and expiry, verified in constant time
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 FitFlow

use crate::config::MediaConfig;
use crate::errors::{AppError, AppResult};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Signs storage paths into time-limited URLs so media links handed to
/// clients cannot be shared indefinitely.
#[derive(Clone)]
pub struct MediaSigner {
    base_url: String,
    signing_secret: String,
    url_expiry_secs: i64,
}

impl MediaSigner {
    /// Build a signer from configuration
    #[must_use]
    pub fn from_config(config: &MediaConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            signing_secret: config.signing_secret.clone(),
            url_expiry_secs: config.url_expiry_secs,
        }
    }

    fn signature(&self, path: &str, expires: i64) -> AppResult<String> {
        let mut mac = HmacSha256::new_from_slice(self.signing_secret.as_bytes())
            .map_err(|e| AppError::internal(format!("Invalid media signing secret: {e}")))?;
        mac.update(format!("{path}:{expires}").as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Produce a signed URL for a storage path, valid until the
    /// configured expiry from `now_unix`
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    pub fn sign(&self, path: &str, now_unix: i64) -> AppResult<String> {
        let path = path.trim_start_matches('/');
        let expires = now_unix + self.url_expiry_secs;
        let sig = self.signature(path, expires)?;
        Ok(format!(
            "{}/{path}?expires={expires}&signature={sig}",
            self.base_url
        ))
    }

    /// Verify a previously issued path signature
    ///
    /// # Errors
    ///
    /// Returns an error when the signature is expired or does not match.
    pub fn verify(&self, path: &str, expires: i64, signature: &str, now_unix: i64) -> AppResult<()> {
        if expires < now_unix {
            return Err(AppError::auth_invalid("Media URL expired"));
        }
        let path = path.trim_start_matches('/');
        let expected = self.signature(path, expires)?;
        if bool::from(signature.as_bytes().ct_eq(expected.as_bytes())) {
            Ok(())
        } else {
            Err(AppError::auth_invalid("Media URL signature mismatch"))
        }
    }
}
