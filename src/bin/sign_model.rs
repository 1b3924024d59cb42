//! Model signing utility for Glycorisk model releases.
//!
//! Writes `manifest.json` (SHA-256 of every bound file) and `model.sig`
//! (Ed25519 signature over the manifest bytes) into a model directory.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin sign_model -- <model_dir> --key-file <seed_b64_path> [--include <file>]...
//! cargo run --bin sign_model -- <model_dir> --new-key <seed_b64_path> [--include <file>]...
//! ```
//!
//! `--new-key` creates a fresh signing seed (0600 on Unix) before signing.
//! The base64 public key printed at the end goes into `GLYCORISK_MODEL_PUBKEY_B64`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, bail, Context, Result};
use base64::engine::general_purpose;
use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, Zeroizing};

use glycorisk::adapters::logistic::{
    ModelManifest, MANIFEST_FILE, MANIFEST_VERSION, MODEL_FILE, SIGNATURE_FILE,
};
use glycorisk::domain::sha256_hex;

const USAGE: &str = "Usage: sign_model <model_dir> (--key-file <path> | --new-key <path>) [--include <file>]...";

enum KeySource {
    Existing(PathBuf),
    Generate(PathBuf),
}

struct Args {
    model_dir: PathBuf,
    key: KeySource,
    include: Vec<String>,
}

fn parse_args() -> Result<Args> {
    let mut args = std::env::args().skip(1);
    let mut model_dir = None;
    let mut key = None;
    let mut include = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--key-file" => {
                let p = args.next().ok_or_else(|| anyhow!(USAGE))?;
                key = Some(KeySource::Existing(PathBuf::from(p)));
            }
            "--new-key" => {
                let p = args.next().ok_or_else(|| anyhow!(USAGE))?;
                key = Some(KeySource::Generate(PathBuf::from(p)));
            }
            "--include" => include.push(args.next().ok_or_else(|| anyhow!(USAGE))?),
            "-h" | "--help" => bail!(USAGE),
            _ if model_dir.is_none() => model_dir = Some(PathBuf::from(arg)),
            _ => bail!("Unexpected argument: {arg}\n{USAGE}"),
        }
    }

    Ok(Args {
        model_dir: model_dir.ok_or_else(|| anyhow!(USAGE))?,
        key: key.ok_or_else(|| anyhow!(USAGE))?,
        include,
    })
}

fn read_seed(path: &Path) -> Result<[u8; 32]> {
    let b64 = Zeroizing::new(
        fs::read_to_string(path).with_context(|| format!("Failed to read signing key {path:?}"))?,
    );
    let mut raw = general_purpose::STANDARD
        .decode(b64.trim())
        .context("Signing key is not valid base64")?;
    let seed: Result<[u8; 32]> = raw
        .as_slice()
        .try_into()
        .map_err(|_| anyhow!("Signing key seed must be 32 bytes (got {})", raw.len()));
    raw.zeroize();
    seed
}

fn write_new_seed(path: &Path) -> Result<[u8; 32]> {
    if path.exists() {
        bail!("Refusing to overwrite existing key file {path:?}");
    }

    let mut seed = [0u8; 32];
    OsRng.fill_bytes(&mut seed);
    let b64 = Zeroizing::new(general_purpose::STANDARD.encode(seed));

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options
        .open(path)
        .with_context(|| format!("Failed to create key file {path:?}"))?;
    std::io::Write::write_all(&mut file, format!("{}\n", b64.as_str()).as_bytes())?;

    eprintln!("Wrote new signing seed to {path:?}");
    Ok(seed)
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn main() -> Result<()> {
    let args = parse_args()?;

    let mut seed = match &args.key {
        KeySource::Existing(p) => read_seed(p)?,
        KeySource::Generate(p) => write_new_seed(p)?,
    };
    let signing_key = SigningKey::from_bytes(&seed);
    seed.zeroize();

    let mut files = std::collections::BTreeMap::new();
    for rel in std::iter::once(MODEL_FILE.to_string()).chain(args.include) {
        let path = args.model_dir.join(&rel);
        let bytes = fs::read(&path).with_context(|| format!("Failed to read {path:?}"))?;
        files.insert(rel, sha256_hex(&bytes));
    }

    let manifest = ModelManifest {
        version: MANIFEST_VERSION,
        created_at: Some(unix_now()),
        files,
    };
    let manifest_bytes =
        serde_json::to_vec_pretty(&manifest).context("Failed to serialize manifest")?;

    let manifest_path = args.model_dir.join(MANIFEST_FILE);
    fs::write(&manifest_path, &manifest_bytes)
        .with_context(|| format!("Failed to write {manifest_path:?}"))?;

    let sig: Signature = signing_key.sign(&manifest_bytes);
    let sig_path = args.model_dir.join(SIGNATURE_FILE);
    fs::write(&sig_path, sig.to_bytes()).with_context(|| format!("Failed to write {sig_path:?}"))?;

    println!("Signed manifest: {manifest_path:?}");
    println!("Wrote signature: {sig_path:?}");
    println!(
        "GLYCORISK_MODEL_PUBKEY_B64={}",
        general_purpose::STANDARD.encode(signing_key.verifying_key().to_bytes())
    );

    Ok(())
}
