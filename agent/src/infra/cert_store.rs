//! Infrastructure implementation of the `CertificateStore` port.
//!
//! `FileCertificateStore` keeps every alias in one password-protected file:
//! a JSON envelope around an AES-256-GCM ciphertext whose key is derived
//! with Argon2id. Writes go through a temp file and rename so a crash never
//! leaves a half-written store behind.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use argon2::{Algorithm, Argon2, Params, Version};
use chrono::{DateTime, Utc};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::application::ports::CertificateStore;
use crate::domain::{Certificate, CertificateEntry, RegistrationResult, StoreError};

const FORMAT_VERSION: u32 = 1;
const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;

// Upper bounds accepted from a file header: 1 GiB of memory, 16 passes, 16 lanes.
const MAX_M_COST: u32 = 1 << 20;
const MAX_T_COST: u32 = 16;
const MAX_P_COST: u32 = 16;

/// Argon2id cost parameters recorded in every store file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    pub m_cost: u32,
    pub t_cost: u32,
    pub p_cost: u32,
}

impl KdfParams {
    fn within_bounds(self) -> bool {
        self.m_cost <= MAX_M_COST && self.t_cost <= MAX_T_COST && self.p_cost <= MAX_P_COST
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            m_cost: Params::DEFAULT_M_COST,
            t_cost: Params::DEFAULT_T_COST,
            p_cost: Params::DEFAULT_P_COST,
        }
    }
}

/// On-disk layout. `verifier` is the SHA-256 of the derived key and tells a
/// wrong password apart from a damaged ciphertext.
#[derive(Serialize, Deserialize)]
struct Envelope {
    version: u32,
    kdf: KdfParams,
    salt: Vec<u8>,
    verifier: Vec<u8>,
    nonce: Vec<u8>,
    ciphertext: Vec<u8>,
}

#[derive(Default, Serialize, Deserialize)]
struct Contents {
    entries: BTreeMap<String, StoredEntry>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredEntry {
    chain: Vec<Certificate>,
    not_before: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    private_key: Option<String>,
    stored_at: DateTime<Utc>,
}

impl From<&StoredEntry> for CertificateEntry {
    fn from(entry: &StoredEntry) -> Self {
        Self {
            chain: entry.chain.clone(),
            not_before: entry.not_before,
            private_key: entry.private_key.clone().map(Zeroizing::new),
            stored_at: entry.stored_at,
        }
    }
}

/// Decrypted store plus the parameters needed to write it back.
struct Opened {
    kdf: KdfParams,
    salt: Vec<u8>,
    contents: Contents,
}

struct CachedKey {
    kdf: KdfParams,
    salt: Vec<u8>,
    key: Zeroizing<[u8; 32]>,
}

/// Password-protected certificate store backed by a single file.
pub struct FileCertificateStore {
    path: PathBuf,
    password: Zeroizing<String>,
    kdf: KdfParams,
    key_cache: Mutex<Option<CachedKey>>,
}

impl FileCertificateStore {
    /// Create a store handle. Nothing touches the disk until first use.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, password: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            password: Zeroizing::new(password.into()),
            kdf: KdfParams::default(),
            key_cache: Mutex::new(None),
        }
    }

    /// Override the Argon2id cost used for newly created files.
    #[must_use]
    pub fn with_kdf_params(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }

    /// Create a store handle and make sure the backing file exists.
    ///
    /// # Errors
    ///
    /// Returns the `ensure_initialized` failure.
    pub fn preload(path: impl Into<PathBuf>, password: impl Into<String>) -> Result<Self, StoreError> {
        let store = Self::new(path, password);
        store.ensure_initialized()?;
        Ok(store)
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn corrupt(&self, reason: impl Into<String>) -> StoreError {
        StoreError::Corrupt {
            path: self.path.clone(),
            reason: reason.into(),
        }
    }

    fn crypto(&self, reason: impl Into<String>) -> StoreError {
        StoreError::Crypto {
            path: self.path.clone(),
            reason: reason.into(),
        }
    }

    /// Derive the file key, reusing the last derivation for the same salt.
    fn derive_key(&self, kdf: KdfParams, salt: &[u8]) -> Result<Zeroizing<[u8; 32]>, String> {
        let mut cache = self.key_cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = cache.as_ref()
            && cached.kdf == kdf
            && cached.salt == salt
        {
            return Ok(cached.key.clone());
        }

        let params = Params::new(kdf.m_cost, kdf.t_cost, kdf.p_cost, Some(32))
            .map_err(|e| format!("invalid KDF parameters: {e}"))?;
        let mut key = Zeroizing::new([0u8; 32]);
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
            .hash_password_into(self.password.as_bytes(), salt, &mut key[..])
            .map_err(|e| format!("key derivation: {e}"))?;

        *cache = Some(CachedKey {
            kdf,
            salt: salt.to_vec(),
            key: key.clone(),
        });
        Ok(key)
    }

    /// Read and decrypt the file. A missing file is `Ok(None)`.
    fn open(&self) -> Result<Option<Opened>, StoreError> {
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };
        let envelope: Envelope = serde_json::from_slice(&raw)
            .map_err(|e| self.corrupt(format!("unreadable envelope: {e}")))?;
        if envelope.version != FORMAT_VERSION {
            return Err(self.corrupt(format!("unsupported format version {}", envelope.version)));
        }
        if envelope.nonce.len() != NONCE_LEN {
            return Err(self.corrupt("invalid nonce length"));
        }
        if envelope.salt.len() != SALT_LEN {
            return Err(self.corrupt("invalid salt length"));
        }
        if !envelope.kdf.within_bounds() {
            return Err(self.corrupt(format!("KDF parameters out of range: {:?}", envelope.kdf)));
        }

        let key = self
            .derive_key(envelope.kdf, &envelope.salt)
            .map_err(|reason| self.corrupt(reason))?;
        if Sha256::digest(&key[..]).as_slice() != envelope.verifier.as_slice() {
            return Err(StoreError::PasswordMismatch {
                path: self.path.clone(),
            });
        }

        let cipher = Aes256Gcm::new_from_slice(&key[..])
            .map_err(|e| self.crypto(e.to_string()))?;
        let plaintext = Zeroizing::new(
            cipher
                .decrypt(Nonce::from_slice(&envelope.nonce), envelope.ciphertext.as_slice())
                .map_err(|_| self.corrupt("ciphertext failed authentication"))?,
        );
        let contents: Contents = serde_json::from_slice(&plaintext)
            .map_err(|e| self.corrupt(format!("unreadable entries: {e}")))?;

        Ok(Some(Opened {
            kdf: envelope.kdf,
            salt: envelope.salt,
            contents,
        }))
    }

    /// A brand-new empty store with a fresh salt.
    fn fresh(&self) -> Opened {
        let mut salt = vec![0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        Opened {
            kdf: self.kdf,
            salt,
            contents: Contents::default(),
        }
    }

    fn write(&self, opened: &Opened) -> Result<(), StoreError> {
        let key = self
            .derive_key(opened.kdf, &opened.salt)
            .map_err(|reason| self.crypto(reason))?;
        let cipher = Aes256Gcm::new_from_slice(&key[..])
            .map_err(|e| self.crypto(e.to_string()))?;

        let plaintext = Zeroizing::new(
            serde_json::to_vec(&opened.contents)
                .map_err(|e| self.crypto(format!("serializing entries: {e}")))?,
        );
        let mut nonce = vec![0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_slice())
            .map_err(|e| self.crypto(format!("encryption: {e}")))?;

        let envelope = Envelope {
            version: FORMAT_VERSION,
            kdf: opened.kdf,
            salt: opened.salt.clone(),
            verifier: Sha256::digest(&key[..]).to_vec(),
            nonce,
            ciphertext,
        };
        let bytes = serde_json::to_vec(&envelope)
            .map_err(|e| self.crypto(format!("serializing envelope: {e}")))?;
        self.write_atomic(&bytes)
    }

    fn write_atomic(&self, bytes: &[u8]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let temp_path = self.path.with_extension("tmp");
        std::fs::write(&temp_path, bytes).map_err(|e| self.io_error(e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))
                .map_err(|e| self.io_error(e))?;
        }

        std::fs::rename(&temp_path, &self.path).map_err(|e| self.io_error(e))
    }
}

impl CertificateStore for FileCertificateStore {
    fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_initialized(&self) -> Result<(), StoreError> {
        if self.open()?.is_none() {
            tracing::debug!(path = %self.path.display(), "creating empty certificate store");
            self.write(&self.fresh())?;
        }
        Ok(())
    }

    fn has_entry(&self, alias: &str) -> bool {
        matches!(self.load(alias), Ok(Some(entry)) if !entry.chain.is_empty())
    }

    fn load(&self, alias: &str) -> Result<Option<CertificateEntry>, StoreError> {
        Ok(self
            .open()?
            .and_then(|opened| opened.contents.entries.get(alias).map(CertificateEntry::from)))
    }

    fn store(&self, alias: &str, result: &RegistrationResult) -> Result<(), StoreError> {
        if result.is_empty() {
            return Err(StoreError::EmptyChain {
                alias: alias.to_string(),
            });
        }
        let mut opened = match self.open()? {
            Some(opened) => opened,
            None => self.fresh(),
        };
        opened.contents.entries.insert(
            alias.to_string(),
            StoredEntry {
                chain: result.chain().to_vec(),
                not_before: result.not_before(),
                private_key: result.private_key().map(str::to_string),
                stored_at: Utc::now(),
            },
        );
        self.write(&opened)
    }

    fn delete(&self, alias: &str) -> Result<(), StoreError> {
        let Some(mut opened) = self.open()? else {
            return Ok(());
        };
        if opened.contents.entries.remove(alias).is_some() {
            self.write(&opened)?;
        }
        Ok(())
    }

    fn check(&self) -> Result<(), StoreError> {
        self.open().map(|_| ())
    }

    fn wipe(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(self.io_error(e)),
        }
        *self.key_cache.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
