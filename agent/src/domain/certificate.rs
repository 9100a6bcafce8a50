//! Certificate chain types received from the coordinator.
//!
//! This module is intentionally free of I/O, async, and external layer imports.
//! All functions take data in and return data out.

use std::fmt;

use chrono::{DateTime, Utc};
use fleet_common::RegistrationResponse;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::domain::error::{CertificateError, TransportError};

/// One PEM encoded X.509 certificate together with its decoded DER bytes.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Certificate {
    pem: String,
    der: Vec<u8>,
}

impl Certificate {
    /// Parse a single PEM `CERTIFICATE` block.
    ///
    /// # Errors
    ///
    /// Returns an error if `pem` holds no certificate block, more than one,
    /// or a block whose payload is not valid base64.
    pub fn from_pem(pem: &str) -> Result<Self, CertificateError> {
        let mut reader = pem.as_bytes();
        let ders = rustls_pemfile::certs(&mut reader)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| CertificateError::InvalidPem(e.to_string()))?;
        match ders.as_slice() {
            [] => Err(CertificateError::Missing),
            [der] => Ok(Self {
                pem: pem.trim().to_string(),
                der: der.to_vec(),
            }),
            many => Err(CertificateError::Multiple(many.len())),
        }
    }

    #[must_use]
    pub fn pem(&self) -> &str {
        &self.pem
    }

    #[must_use]
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// SHA-256 over the DER encoding, lowercase hex.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        hex_encode(&Sha256::digest(&self.der))
    }
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("sha256", &self.fingerprint())
            .finish()
    }
}

impl TryFrom<String> for Certificate {
    type Error = CertificateError;

    fn try_from(pem: String) -> Result<Self, Self::Error> {
        Self::from_pem(&pem)
    }
}

impl From<Certificate> for String {
    fn from(cert: Certificate) -> Self {
        cert.pem
    }
}

// ── Registration result ───────────────────────────────────────────────────────

/// Outcome of one registration round trip.
///
/// An empty chain means the coordinator has not admitted the agent yet; such
/// a result is never valid and is never persisted.
#[derive(Clone)]
pub struct RegistrationResult {
    chain: Vec<Certificate>,
    not_before: Option<DateTime<Utc>>,
    private_key: Option<Zeroizing<String>>,
}

impl RegistrationResult {
    #[must_use]
    pub fn new(
        chain: Vec<Certificate>,
        not_before: Option<DateTime<Utc>>,
        private_key: Option<String>,
    ) -> Self {
        Self {
            chain,
            not_before,
            private_key: private_key.map(Zeroizing::new),
        }
    }

    /// A "not yet admitted" result carrying no certificates.
    #[must_use]
    pub fn pending() -> Self {
        Self::new(Vec::new(), None, None)
    }

    /// Convert the coordinator's wire response.
    ///
    /// A pending response converts to an empty result. An issued chain must
    /// carry a `notBefore` timestamp and valid PEM certificates.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::MalformedResponse` when a chain element is
    /// not a single PEM certificate or `notBefore` is missing.
    pub fn from_response(response: RegistrationResponse) -> Result<Self, TransportError> {
        if response.is_pending() {
            return Ok(Self::pending());
        }
        let chain = response
            .certificate_chain
            .iter()
            .enumerate()
            .map(|(i, pem)| {
                Certificate::from_pem(pem).map_err(|e| {
                    TransportError::MalformedResponse(format!("chain element {i}: {e}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let not_before = response.not_before.ok_or_else(|| {
            TransportError::MalformedResponse("issued chain is missing notBefore".to_string())
        })?;
        Ok(Self::new(
            chain,
            Some(not_before),
            response.agent_private_key,
        ))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Certificates, leaf first.
    #[must_use]
    pub fn chain(&self) -> &[Certificate] {
        &self.chain
    }

    #[must_use]
    pub fn leaf(&self) -> Option<&Certificate> {
        self.chain.first()
    }

    #[must_use]
    pub fn not_before(&self) -> Option<DateTime<Utc>> {
        self.not_before
    }

    #[must_use]
    pub fn private_key(&self) -> Option<&str> {
        self.private_key.as_ref().map(|k| k.as_str())
    }

    /// Fingerprint of the leaf certificate, for logging only.
    #[must_use]
    pub fn fingerprint(&self) -> Option<String> {
        self.leaf().map(Certificate::fingerprint)
    }

    /// The root of the chain as a single-certificate result without key
    /// material, used to pin the coordinator's certificate.
    #[must_use]
    pub fn trust_anchor(&self) -> Option<Self> {
        self.chain
            .last()
            .map(|root| Self::new(vec![root.clone()], self.not_before, None))
    }
}

impl fmt::Debug for RegistrationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationResult")
            .field("chain", &self.chain)
            .field("not_before", &self.not_before)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

// ── Stored entry ──────────────────────────────────────────────────────────────

/// A certificate chain as read back from a certificate store.
#[derive(Clone)]
pub struct CertificateEntry {
    pub chain: Vec<Certificate>,
    pub not_before: Option<DateTime<Utc>>,
    pub private_key: Option<Zeroizing<String>>,
    pub stored_at: DateTime<Utc>,
}

impl CertificateEntry {
    #[must_use]
    pub fn fingerprint(&self) -> Option<String> {
        self.chain.first().map(Certificate::fingerprint)
    }
}

impl fmt::Debug for CertificateEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateEntry")
            .field("chain", &self.chain)
            .field("not_before", &self.not_before)
            .field("stored_at", &self.stored_at)
            .finish_non_exhaustive()
    }
}

/// Encode bytes as lowercase hex string.
#[must_use]
pub fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(char::from(HEX[(b >> 4) as usize]));
        out.push(char::from(HEX[(b & 0xf) as usize]));
    }
    out
}
