//! Artifact integrity: signed manifest verification.
//!
//! The directory holding an artifact may carry:
//! - `manifest.json`: `{version, created_at?, nonce_b64?, files: {name: sha256-hex}}`
//! - `artifacts.sig`: raw 64-byte Ed25519 signature over the exact manifest bytes
//!
//! Both are written by the `sign_artifacts` binary.
//!
//! # Policy
//!
//! - `auto`: hashes are checked whenever a manifest is present, the signature is
//!   checked whenever a signature file and a public key are both available.
//! - `required`: manifest, signature and public key are all mandatory.
//! - `off`: nothing is checked.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use base64::Engine;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const SIGNATURE_FILE: &str = "artifacts.sig";
pub const MANIFEST_VERSION: u32 = 1;

/// Clock skew allowance for `created_at`.
const MAX_FUTURE_SKEW_SECS: i64 = 300;

/// How strictly artifacts are checked against their manifest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IntegrityPolicy {
    #[default]
    Auto,
    Required,
    Off,
}

impl FromStr for IntegrityPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "required" | "require" | "strict" => Ok(Self::Required),
            "off" | "none" | "disabled" => Ok(Self::Off),
            other => Err(format!("unknown integrity policy '{other}'")),
        }
    }
}

impl fmt::Display for IntegrityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::Required => "required",
            Self::Off => "off",
        })
    }
}

/// Signed list of artifact digests.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Manifest {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce_b64: Option<String>,
    pub files: BTreeMap<String, String>,
}

/// What was actually verified for one artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// Policy off, or no manifest under `auto`
    Skipped,
    /// Digest matched an unsigned (or unverifiable) manifest
    HashOnly,
    /// Digest matched a manifest with a valid signature
    Signed,
}

/// Checks artifact files against the manifest in their directory.
#[derive(Debug, Clone, Default)]
pub struct IntegrityVerifier {
    policy: IntegrityPolicy,
    public_key: Option<VerifyingKey>,
}

impl IntegrityVerifier {
    #[must_use]
    pub fn new(policy: IntegrityPolicy, public_key: Option<VerifyingKey>) -> Self {
        Self { policy, public_key }
    }

    /// Build a verifier, reading the public key from a base64 file if given.
    ///
    /// # Errors
    /// Returns a reason string if the key file is unreadable or malformed.
    pub fn from_key_file(policy: IntegrityPolicy, key_file: Option<&Path>) -> Result<Self, String> {
        let public_key = match key_file {
            Some(path) if policy != IntegrityPolicy::Off => {
                let b64 = fs::read_to_string(path)
                    .map_err(|e| format!("failed reading public key file: {e}"))?;
                Some(verifying_key_from_b64(&b64)?)
            }
            _ => None,
        };
        Ok(Self::new(policy, public_key))
    }

    #[must_use]
    pub fn policy(&self) -> IntegrityPolicy {
        self.policy
    }

    /// Verify the loaded contents of one artifact against the manifest beside
    /// it. `artifact` locates the manifest and names the entry; `bytes` are
    /// the contents that get hashed and must be the same buffer the caller
    /// goes on to parse.
    ///
    /// # Errors
    /// Returns a reason string on any failed or missing mandatory check.
    pub fn verify(&self, artifact: &Path, bytes: &[u8]) -> Result<Verification, String> {
        if self.policy == IntegrityPolicy::Off {
            return Ok(Verification::Skipped);
        }

        let dir = artifact
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let manifest_path = dir.join(MANIFEST_FILE);
        let sig_path = dir.join(SIGNATURE_FILE);

        if !manifest_path.exists() {
            if self.policy == IntegrityPolicy::Required {
                return Err(format!("{MANIFEST_FILE} not found in {}", dir.display()));
            }
            tracing::warn!(
                "No {MANIFEST_FILE} beside {}; loading without integrity check",
                artifact.display()
            );
            return Ok(Verification::Skipped);
        }

        let manifest_bytes =
            fs::read(&manifest_path).map_err(|e| format!("failed to read manifest: {e}"))?;

        let signed = match (&self.public_key, sig_path.exists()) {
            (Some(key), true) => {
                verify_signature(key, &manifest_bytes, &sig_path)?;
                true
            }
            (None, true) if self.policy == IntegrityPolicy::Required => {
                return Err("no public key configured to verify the signature".into());
            }
            (_, false) if self.policy == IntegrityPolicy::Required => {
                return Err(format!("{SIGNATURE_FILE} not found in {}", dir.display()));
            }
            (None, true) => {
                tracing::warn!("{SIGNATURE_FILE} present but no public key configured; checking hashes only");
                false
            }
            (_, false) => {
                tracing::warn!("Manifest is unsigned; checking hashes only");
                false
            }
        };

        let manifest: Manifest = serde_json::from_slice(&manifest_bytes)
            .map_err(|e| format!("invalid {MANIFEST_FILE} format: {e}"))?;
        check_manifest(&manifest)?;

        let name = artifact
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| format!("invalid artifact file name {}", artifact.display()))?;
        let expected = manifest
            .files
            .get(name)
            .ok_or_else(|| format!("{MANIFEST_FILE} does not bind {name}"))?;

        if !constant_time_eq_str(&sha256_hex(bytes), &expected.to_ascii_lowercase()) {
            return Err(format!("file hash mismatch for {name}"));
        }

        if signed {
            tracing::info!("Artifact {name}: signature and hash verified");
            Ok(Verification::Signed)
        } else {
            tracing::info!("Artifact {name}: hash verified");
            Ok(Verification::HashOnly)
        }
    }
}

fn verify_signature(key: &VerifyingKey, manifest: &[u8], sig_path: &Path) -> Result<(), String> {
    let sig_bytes = fs::read(sig_path).map_err(|e| format!("failed to read signature: {e}"))?;
    let sig_array: [u8; 64] = sig_bytes
        .as_slice()
        .try_into()
        .map_err(|_| "invalid signature length (expected 64 bytes)".to_string())?;
    let signature = Signature::from_bytes(&sig_array);

    key.verify(manifest, &signature)
        .map_err(|_| "invalid manifest signature".to_string())
}

fn check_manifest(manifest: &Manifest) -> Result<(), String> {
    if manifest.version != MANIFEST_VERSION {
        return Err(format!(
            "unsupported manifest version: {}",
            manifest.version
        ));
    }
    if manifest.files.is_empty() {
        return Err(format!("{MANIFEST_FILE} contains no files"));
    }
    if let Some(nonce) = &manifest.nonce_b64 {
        validate_nonce_b64(nonce)?;
    }
    if let Some(created_at) = manifest.created_at {
        if created_at > chrono::Utc::now().timestamp() + MAX_FUTURE_SKEW_SECS {
            return Err("manifest created_at is in the future".into());
        }
    }
    Ok(())
}

/// Lowercase hex SHA-256 digest.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Manifest nonces are 16 random bytes, base64 encoded.
///
/// # Errors
/// Returns a reason string for invalid base64 or a wrong length.
pub fn validate_nonce_b64(nonce_b64: &str) -> Result<(), String> {
    let raw = base64::engine::general_purpose::STANDARD
        .decode(nonce_b64.trim())
        .map_err(|e| format!("invalid nonce base64: {e}"))?;
    if raw.len() != 16 {
        return Err("invalid nonce length (expected 16 bytes)".into());
    }
    Ok(())
}

/// Decode a base64 Ed25519 public key.
///
/// # Errors
/// Returns a reason string for invalid base64, length or key bytes.
pub fn verifying_key_from_b64(b64: &str) -> Result<VerifyingKey, String> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64.trim())
        .map_err(|_| "invalid public key base64".to_string())?;
    let key: [u8; 32] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| "invalid public key length (expected 32 bytes)".to_string())?;
    VerifyingKey::from_bytes(&key).map_err(|_| "invalid verifying key".to_string())
}

// Constant-time compare for ASCII strings (used for SHA-256 hex digests).
fn constant_time_eq_str(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes().iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
