//! Ed25519 keypair generation for artifact signing.
//!
//! Writes the base64 32-byte seed read by `sign_artifacts`, and optionally the
//! base64 public key the terminal application loads from
//! `HEMOCAST_ARTIFACT_PUBKEY_B64_FILE`.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin generate_keypair -- --out-seed <path> [--out-pub <path>] [--force]
//! ```

use std::fs::{self, OpenOptions};
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use base64::engine::general_purpose;
use base64::Engine;
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, Zeroizing};

const USAGE: &str = "Usage: generate_keypair --out-seed <path> [--out-pub <path>] [--force]";

struct Args {
    out_seed: PathBuf,
    out_pub: Option<PathBuf>,
    force: bool,
}

fn parse_args() -> Result<Option<Args>> {
    let mut args = std::env::args().skip(1);
    let mut out_seed = None;
    let mut out_pub = None;
    let mut force = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--out-seed" => {
                out_seed = Some(PathBuf::from(args.next().ok_or_else(|| anyhow!(USAGE))?));
            }
            "--out-pub" => {
                out_pub = Some(PathBuf::from(args.next().ok_or_else(|| anyhow!(USAGE))?));
            }
            "--force" => force = true,
            "-h" | "--help" => {
                println!(
                    "{USAGE}\n\nWrites the base64 Ed25519 seed to <path> with 0600 permissions. Optionally writes the base64 public key to --out-pub. Prints only non-secret material."
                );
                return Ok(None);
            }
            _ => bail!("unknown argument: {arg}\n{USAGE}"),
        }
    }

    Ok(Some(Args {
        out_seed: out_seed.ok_or_else(|| anyhow!(USAGE))?,
        out_pub,
        force,
    }))
}

fn write_key_file(path: &Path, contents: &str, mode: u32) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }

    let mut opts = OpenOptions::new();
    opts.write(true).create(true).truncate(true);
    #[cfg(unix)]
    opts.mode(mode);
    #[cfg(not(unix))]
    let _ = mode;

    let mut file = opts
        .open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    file.write_all(contents.as_bytes())?;
    file.write_all(b"\n")?;
    Ok(())
}

fn main() -> Result<()> {
    let Some(args) = parse_args()? else {
        return Ok(());
    };

    for path in std::iter::once(&args.out_seed).chain(args.out_pub.as_ref()) {
        if path.exists() && !args.force {
            bail!("refusing to overwrite existing file {}; use --force", path.display());
        }
    }

    let mut seed = [0u8; 32];
    OsRng.fill_bytes(&mut seed);

    let signing_key = SigningKey::from_bytes(&seed);
    let seed_b64 = Zeroizing::new(general_purpose::STANDARD.encode(seed));
    seed.zeroize();

    let pub_b64 = general_purpose::STANDARD.encode(signing_key.verifying_key().as_bytes());

    write_key_file(&args.out_seed, &seed_b64, 0o600)?;
    println!("Wrote signing seed (base64) to {}", args.out_seed.display());

    if let Some(pub_path) = &args.out_pub {
        write_key_file(pub_path, &pub_b64, 0o644)?;
        println!("Wrote public key (base64) to {}", pub_path.display());
    }
    println!("Public key (base64): {pub_b64}");

    Ok(())
}
