//! Site builder/publisher (§4.H): downloads every markdown blob, builds the
//! static site with Hugo, validates the output tree, backs up the live
//! site, and deploys — in that order, so a redeploy after a partial
//! failure is easy to reason about.

pub mod error;

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tracing::{error, info, warn};
use walkdir::WalkDir;

use gazette_core::config::SiteConfig;
use gazette_storage::{validate_blob_name, Container};

pub use error::SiteError;

const SUSPICIOUS_EXTENSIONS: &[&str] = &["exe", "sh", "bat", "cmd", "dll", "so", "dylib", "ps1"];

/// Outcome of one publish run (§4.H).
#[derive(Debug, Clone, serde::Serialize)]
pub struct DeploymentResult {
    pub files_uploaded: usize,
    pub duration_secs: f64,
    pub errors: Vec<String>,
}

/// Steps 1–2: copy every `.md` blob from `markdown` into `content_dir`,
/// mirroring its blob path so Hugo sees the same directory structure the
/// renderer wrote. Any blob name failing validation aborts the whole job
/// before anything is downloaded.
pub async fn stage_markdown(markdown: &Container, content_dir: &Path) -> Result<usize, SiteError> {
    let keys = markdown.list("").await?;
    for key in &keys {
        validate_blob_name(key, Some(".md")).map_err(|e| SiteError::InvalidBlob(format!("{key}: {e}")))?;
    }

    for key in &keys {
        let bytes = markdown.get(key).await?;
        let dest = content_dir.join(key);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&dest, bytes).await?;
    }

    Ok(keys.len())
}

/// Step 3: exec Hugo against `build_root` (which must already contain
/// `content/`), writing output to `output_dir`, bounded by
/// `config.build_timeout_secs`.
pub async fn build_site(build_root: &Path, output_dir: &Path, config: &SiteConfig) -> Result<(), SiteError> {
    tokio::fs::create_dir_all(output_dir).await?;

    let child = Command::new(&config.hugo_bin)
        .arg("--config")
        .arg(&config.hugo_config_path)
        .arg("--baseURL")
        .arg(&config.base_url)
        .arg("--destination")
        .arg(output_dir)
        .current_dir(build_root)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let timeout = Duration::from_secs(config.build_timeout_secs);
    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => return Err(SiteError::Io(e)),
        Err(_) => return Err(SiteError::BuildTimedOut(config.build_timeout_secs)),
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        return Err(SiteError::BuildFailed(output.status.code().unwrap_or(-1), stderr));
    }

    Ok(())
}

/// Step 4: `index.html` must exist, no suspicious extensions anywhere in
/// the tree, and every entry must resolve inside `output_dir` (guards
/// against a Hugo config with a malicious symlink or `..`-laden output
/// path).
pub fn validate_output(output_dir: &Path) -> Result<(), SiteError> {
    if !output_dir.join("index.html").is_file() {
        return Err(SiteError::InvalidOutput("missing index.html at output root".into()));
    }

    let canonical_root = output_dir.canonicalize()?;

    for entry in WalkDir::new(output_dir) {
        let entry = entry.map_err(|e| SiteError::InvalidOutput(format!("walk error: {e}")))?;
        let canonical = entry.path().canonicalize()?;
        if !canonical.starts_with(&canonical_root) {
            return Err(SiteError::InvalidOutput(format!("{} resolves outside the build directory", entry.path().display())));
        }

        if entry.file_type().is_file() {
            if let Some(ext) = entry.path().extension().and_then(|e| e.to_str()) {
                if SUSPICIOUS_EXTENSIONS.contains(&ext.to_lowercase().as_str()) {
                    return Err(SiteError::InvalidOutput(format!("suspicious file extension: {}", entry.path().display())));
                }
            }
        }
    }

    Ok(())
}

/// Step 5: mirror the live site into the backup container. Failures here
/// are logged and swallowed — a missed backup shouldn't block a deploy.
pub async fn backup_site(web: &Container, backup: &Container) -> usize {
    match web.mirror_into(backup).await {
        Ok(n) => n,
        Err(e) => {
            warn!(error = %e, "site backup failed, continuing with deploy");
            0
        }
    }
}

/// Step 6: upload the build output to `web`. A failure on the very first
/// file, with a non-empty output tree, is treated as catastrophic — the
/// backup is restored and upload stops there, with both the deploy
/// failure and the rollback outcome recorded in the returned errors. Any
/// later failure is accumulated and reported, not fatal.
pub async fn deploy_site(output_dir: &Path, web: &Container, backup: &Container) -> Result<(usize, Vec<String>), SiteError> {
    let files: Vec<PathBuf> = WalkDir::new(output_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().to_path_buf())
        .collect();

    let mut uploaded = 0;
    let mut errors = Vec::new();

    for (index, path) in files.iter().enumerate() {
        let rel = path.strip_prefix(output_dir).unwrap_or(path).to_string_lossy().replace('\\', "/");
        let bytes = tokio::fs::read(path).await?;

        match web.put(&rel, bytes).await {
            Ok(()) => uploaded += 1,
            Err(e) if index == 0 => {
                error!(error = %e, "first file upload failed, restoring from backup");
                errors.push(format!("deploy failed on {rel}: {e}"));
                match backup.mirror_into(web).await {
                    Ok(n) => {
                        info!(restored = n, "restored site from backup after failed deploy");
                        errors.push(format!("rolled back: restored {n} files from backup"));
                    }
                    Err(restore_err) => {
                        error!(error = %restore_err, "restore from backup also failed");
                        errors.push(format!("rollback also failed: {restore_err}"));
                    }
                }
                break;
            }
            Err(e) => errors.push(format!("{rel}: {e}")),
        }
    }

    Ok((uploaded, errors))
}

/// Run the full publish pipeline end to end, from a clean temp working
/// tree through to a deployed site.
pub async fn publish(markdown: &Container, web: &Container, backup: &Container, config: &SiteConfig) -> Result<DeploymentResult, SiteError> {
    let started = Instant::now();
    let work_dir = std::env::temp_dir().join(format!("gazette-site-build-{}", uuid::Uuid::new_v4()));
    tokio::fs::create_dir_all(&work_dir).await?;

    let result = publish_inner(markdown, web, backup, config, &work_dir, started).await;

    tokio::fs::remove_dir_all(&work_dir).await.ok();
    result
}

async fn publish_inner(
    markdown: &Container,
    web: &Container,
    backup: &Container,
    config: &SiteConfig,
    work_dir: &Path,
    started: Instant,
) -> Result<DeploymentResult, SiteError> {
    let content_dir = work_dir.join("content");
    let staged = stage_markdown(markdown, &content_dir).await?;
    info!(staged, "staged markdown for build");

    let output_dir = work_dir.join("public");
    build_site(work_dir, &output_dir, config).await?;
    validate_output(&output_dir)?;

    backup_site(web, backup).await;

    let (files_uploaded, errors) = deploy_site(&output_dir, web, backup).await?;

    Ok(DeploymentResult { files_uploaded, duration_secs: started.elapsed().as_secs_f64(), errors })
}
