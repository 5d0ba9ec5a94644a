use crate::config::Config;
use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::path::Path;
use time::format_description::well_known::Rfc3339;

pub fn ensure_dir(p: &Path) -> Result<()> {
    std::fs::create_dir_all(p).with_context(|| format!("create_dir_all {}", p.display()))
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    format!("{:x}", h.finalize())
}

pub fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

/// Hash of in-memory image bytes for job ids. Small inputs are hashed in
/// full; the fast mode hashes a head/tail window plus the length so large
/// scans do not pay for a full pass.
pub fn hash_bytes(cfg: &Config, bytes: &[u8]) -> Result<String> {
    let size = bytes.len() as u64;

    match cfg.hashing.mode.as_str() {
        "full_sha256" => Ok(sha256_hex(bytes)),
        "fast_2x16mb" => {
            let w = cfg.hashing.fast_window_bytes.min(size) as usize;
            let mut h = Sha256::new();

            if w > 0 {
                h.update(&bytes[..w]);
                if bytes.len() > w {
                    h.update(&bytes[bytes.len() - w..]);
                }
            }

            h.update(size.to_le_bytes());
            Ok(format!("{:x}", h.finalize()))
        }
        _ => anyhow::bail!("unknown hashing.mode: {}", cfg.hashing.mode),
    }
}
