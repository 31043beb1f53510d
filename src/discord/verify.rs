use axum::http::HeaderMap;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};

use crate::error::SignatureError;

pub const SIGNATURE_HEADER: &str = "x-signature-ed25519";
pub const TIMESTAMP_HEADER: &str = "x-signature-timestamp";

// Checks that interaction requests were signed by the platform over
// `timestamp || body` with the application's key.
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    key: VerifyingKey,
}

impl SignatureVerifier {
    pub fn new(key: VerifyingKey) -> Self {
        Self { key }
    }

    pub fn from_hex(public_key: &str) -> Result<Self, SignatureError> {
        let bytes = hex::decode(public_key.trim()).map_err(|_| SignatureError::InvalidKey)?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|_| SignatureError::InvalidKey)?;
        let key = VerifyingKey::from_bytes(&bytes).map_err(|_| SignatureError::InvalidKey)?;
        Ok(Self::new(key))
    }

    pub fn verify(&self, timestamp: &str, body: &[u8], signature_hex: &str) -> Result<(), SignatureError> {
        let raw = hex::decode(signature_hex.trim()).map_err(|_| SignatureError::Malformed)?;
        let signature = Signature::from_slice(&raw).map_err(|_| SignatureError::Malformed)?;

        let mut message = Vec::with_capacity(timestamp.len() + body.len());
        message.extend_from_slice(timestamp.as_bytes());
        message.extend_from_slice(body);

        self.key
            .verify(&message, &signature)
            .map_err(|_| SignatureError::Mismatch)
    }

    pub fn verify_request(&self, headers: &HeaderMap, body: &[u8]) -> Result<(), SignatureError> {
        let header = |name: &'static str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .ok_or(SignatureError::MissingHeader(name))
        };
        let signature = header(SIGNATURE_HEADER)?;
        let timestamp = header(TIMESTAMP_HEADER)?;
        self.verify(timestamp, body, signature)
    }
}
