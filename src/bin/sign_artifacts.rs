//! Artifact signing utility.
//!
//! Writes `manifest.json` (SHA-256 of the model and scaler artifacts) and
//! `artifacts.sig` (Ed25519 signature over the exact manifest bytes) into the
//! artifact directory. The terminal application checks both at startup.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin sign_artifacts -- <artifact_dir> [--model <file>] [--scaler <file>] [--nonce-b64 <b64>]
//! ```
//!
//! `--model` and `--scaler` default to `xgboost_model.json` and `scaler.json`.
//! Pass them when `HEMOCAST_MODEL_PATH` or `HEMOCAST_SCALER_PATH` use other
//! file names. Either may be a bare name or a path, but the file must sit in
//! `<artifact_dir>`: the manifest binds entries by file name and is looked up
//! beside each artifact.
//!
//! The base64 32-byte seed is read from the file named by
//! `HEMOCAST_SIGNING_KEY_B64_FILE`. Debug builds also accept it inline in
//! `HEMOCAST_SIGNING_KEY_B64`.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use base64::engine::general_purpose;
use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey};
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use hemocast::adapters::artifacts::integrity::{
    sha256_hex, validate_nonce_b64, MANIFEST_FILE, MANIFEST_VERSION, SIGNATURE_FILE,
};
use hemocast::adapters::artifacts::{Manifest, MODEL_FILE, SCALER_FILE};

const KEY_FILE_ENV: &str = "HEMOCAST_SIGNING_KEY_B64_FILE";
const KEY_ENV: &str = "HEMOCAST_SIGNING_KEY_B64";

#[derive(Zeroize, ZeroizeOnDrop)]
struct Seed([u8; 32]);

fn read_signing_seed_b64() -> Result<Zeroizing<String>> {
    let secret = if let Ok(path) = env::var(KEY_FILE_ENV) {
        let content = fs::read_to_string(path.trim())
            .with_context(|| format!("failed reading signing key file from {KEY_FILE_ENV}"))?;
        Zeroizing::new(content.trim_end_matches(['\n', '\r']).to_string())
    } else if cfg!(debug_assertions) && env::var(KEY_ENV).is_ok() {
        Zeroizing::new(env::var(KEY_ENV).unwrap_or_default().trim().to_string())
    } else {
        bail!("missing signing key: set {KEY_FILE_ENV} (inline {KEY_ENV} only in debug builds)");
    };

    if secret.is_empty() {
        bail!("empty signing key");
    }
    Ok(secret)
}

fn read_signing_seed() -> Result<Seed> {
    let b64 = read_signing_seed_b64()?;
    let mut raw = general_purpose::STANDARD
        .decode(b64.trim())
        .map_err(|e| anyhow!("invalid base64 in signing key: {e}"))?;

    if raw.len() != 32 {
        let len = raw.len();
        raw.zeroize();
        bail!("signing key seed must be 32 bytes after base64 decode (got {len})");
    }

    let mut seed = Seed([0u8; 32]);
    seed.0.copy_from_slice(&raw);
    raw.zeroize();
    Ok(seed)
}

fn usage() -> anyhow::Error {
    anyhow!(
        "Usage: sign_artifacts <artifact_dir> [--model <file>] [--scaler <file>] [--nonce-b64 <b64_16_bytes>]"
    )
}

struct Args {
    dir: PathBuf,
    model: Option<PathBuf>,
    scaler: Option<PathBuf>,
    nonce_b64: Option<String>,
}

fn parse_args() -> Result<Args> {
    let mut args = env::args().skip(1);
    let mut dir: Option<PathBuf> = None;
    let mut model = None;
    let mut scaler = None;
    let mut nonce_b64 = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--model" => model = Some(PathBuf::from(args.next().ok_or_else(usage)?)),
            "--scaler" => scaler = Some(PathBuf::from(args.next().ok_or_else(usage)?)),
            "--nonce-b64" => nonce_b64 = Some(args.next().ok_or_else(usage)?),
            "-h" | "--help" => return Err(usage()),
            _ if dir.is_none() => dir = Some(PathBuf::from(arg)),
            _ => return Err(usage()),
        }
    }

    Ok(Args {
        dir: dir.ok_or_else(usage)?,
        model,
        scaler,
        nonce_b64,
    })
}

/// Manifest entry names and the files they hash.
///
/// A bare name is taken relative to `dir`. Any other path must resolve into
/// `dir`, since verification looks the manifest up beside the artifact.
fn artifact_files(
    dir: &Path,
    model: Option<&Path>,
    scaler: Option<&Path>,
) -> Result<BTreeMap<String, PathBuf>> {
    let dir_real = fs::canonicalize(dir)
        .with_context(|| format!("artifact directory {} not found", dir.display()))?;

    let mut files = BTreeMap::new();
    for (given, default) in [(model, MODEL_FILE), (scaler, SCALER_FILE)] {
        let given = given.unwrap_or_else(|| Path::new(default));
        let path = if given.parent().map_or(true, |p| p.as_os_str().is_empty()) {
            dir.join(given)
        } else {
            given.to_path_buf()
        };

        if !path.is_file() {
            bail!("{} not found", path.display());
        }
        let parent = path
            .parent()
            .map(fs::canonicalize)
            .transpose()
            .with_context(|| format!("failed to resolve {}", path.display()))?;
        if parent.as_deref() != Some(dir_real.as_path()) {
            bail!(
                "{} is not in {}; the manifest only binds files in its own directory",
                path.display(),
                dir.display()
            );
        }

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow!("invalid artifact file name {}", path.display()))?
            .to_string();
        if files.insert(name.clone(), path).is_some() {
            bail!("{name} given for both model and scaler");
        }
    }
    Ok(files)
}

fn make_nonce_b64() -> String {
    let mut nonce = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut nonce);
    general_purpose::STANDARD.encode(nonce)
}

fn main() -> Result<()> {
    let args = parse_args()?;

    let dir = if args.dir.is_file() {
        args.dir
            .parent()
            .ok_or_else(|| anyhow!("artifact path has no parent directory"))?
            .to_path_buf()
    } else {
        args.dir
    };

    let mut files = BTreeMap::new();
    for (name, path) in artifact_files(&dir, args.model.as_deref(), args.scaler.as_deref())? {
        let bytes = fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
        println!("Hashed {name}");
        files.insert(name, sha256_hex(&bytes));
    }

    let nonce_b64 = match args.nonce_b64 {
        Some(v) => {
            validate_nonce_b64(&v).map_err(|e| anyhow!(e))?;
            v
        }
        None => make_nonce_b64(),
    };

    let manifest = Manifest {
        version: MANIFEST_VERSION,
        created_at: Some(chrono::Utc::now().timestamp()),
        nonce_b64: Some(nonce_b64),
        files,
    };
    let manifest_bytes =
        serde_json::to_vec_pretty(&manifest).context("failed to serialize manifest")?;

    let seed = read_signing_seed()?;
    let signing_key = SigningKey::from_bytes(&seed.0);
    drop(seed);

    let manifest_path = dir.join(MANIFEST_FILE);
    fs::write(&manifest_path, &manifest_bytes)
        .with_context(|| format!("failed to write {}", manifest_path.display()))?;

    let signature: Signature = signing_key.sign(&manifest_bytes);
    let sig_path = dir.join(SIGNATURE_FILE);
    fs::write(&sig_path, signature.to_bytes())
        .with_context(|| format!("failed to write {}", sig_path.display()))?;

    println!("Signed manifest: {}", manifest_path.display());
    println!("Wrote signature: {}", sig_path.display());
    println!(
        "Public key (base64): {}",
        general_purpose::STANDARD.encode(signing_key.verifying_key().as_bytes())
    );

    Ok(())
}
