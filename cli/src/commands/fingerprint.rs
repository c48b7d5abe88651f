use std::fs;
use std::path::Path;

use anyhow::Context;
use ion_rewards_common::sha256_hex;

/// Print the sha256 of `file` in `sha256sum` format.
pub fn run(file: &Path) -> anyhow::Result<()> {
    let bytes = fs::read(file).with_context(|| format!("reading {}", file.display()))?;
    println!("{}  {}", sha256_hex(&bytes), file.display());
    Ok(())
}
