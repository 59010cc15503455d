use anyhow::Context;
use std::path::Path;

/// Upload cap enforced before anything is staged.
pub const MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

/// Collision-resistant object name: millisecond stamp plus a random suffix,
/// keeping the original extension so the asset serves with the right type.
pub fn object_name(original: &Path) -> String {
    let ext = original
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("bin");
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}.{}", millis, &suffix[..8], ext)
}

/// Copy a staged file into the workspace asset store.
pub fn store(workspace: &Path, bucket: &str, name: &str, src: &Path) -> anyhow::Result<()> {
    let dir = workspace.join("assets").join(bucket);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("create asset bucket {}", bucket))?;
    std::fs::copy(src, dir.join(name))
        .with_context(|| format!("store {} into {}", src.display(), bucket))?;
    Ok(())
}

/// Stable reference recorded on the row; the UI shell serves `assets/`
/// straight from the workspace.
pub fn public_url(bucket: &str, name: &str) -> String {
    format!("assets/{}/{}", bucket, name)
}
