use anyhow::Context;
use std::fs;
use std::path::Path;

/// Writes `bytes` next to `dst` and swaps the file into place.
///
/// A crash mid-write leaves either the old file or the new one, never a torn
/// mix of both.
pub fn write_atomic(dst: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = dst.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory: {}", parent.display()))?;
    }

    let tmp = dst.with_extension("tmp");
    fs::write(&tmp, bytes).with_context(|| format!("write temp: {}", tmp.display()))?;
    replace_file(&tmp, dst).with_context(|| format!("replace file: {}", dst.display()))
}

pub fn replace_file(tmp: &Path, dst: &Path) -> anyhow::Result<()> {
    let backup = dst.with_extension("bak");

    if dst.exists() {
        let _ = fs::remove_file(&backup);
        fs::rename(dst, &backup)
            .with_context(|| format!("failed rename {} -> {}", dst.display(), backup.display()))?;
    }

    if let Err(e) = fs::rename(tmp, dst) {
        // Put the previous file back if we moved it aside.
        if backup.exists() {
            let _ = fs::rename(&backup, dst);
        }
        let _ = fs::remove_file(tmp);
        return Err(anyhow::Error::new(e).context(format!(
            "failed rename {} -> {}",
            tmp.display(),
            dst.display()
        )));
    }

    let _ = fs::remove_file(&backup);
    Ok(())
}
