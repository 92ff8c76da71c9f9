use crate::error::{IngestError, Result};
use crate::policy::FetchPolicy;
use crate::session::SandboxSession;
use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;

/// Caps applied to a repository ingest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoLimits {
    /// Combined size of collected text files
    pub max_total_bytes: u64,
    /// Individual files above this are skipped, not fatal
    pub max_file_bytes: u64,
    /// Collected file count above this is fatal
    pub max_files: usize,
    pub clone_timeout_secs: u64,
}

impl Default for RepoLimits {
    fn default() -> Self {
        Self {
            max_total_bytes: 128 * 1024 * 1024,
            max_file_bytes: 1_048_576,
            max_files: 5_000,
            clone_timeout_secs: 120,
        }
    }
}

/// A text file lifted out of a cloned repository
#[derive(Debug, Clone)]
pub struct RepoFile {
    pub rel_path: String,
    pub text: String,
}

/// Shallow-clones a screened URL into a sandbox session and collects its
/// text files
///
/// The clone is data-only from the start: `--depth 1`, no tags, no LFS
/// smudge, no credential prompts, and every execute bit stripped before
/// anything else looks at the tree. Nothing in a session is ever run.
pub struct RepoFetcher {
    policy: FetchPolicy,
    limits: RepoLimits,
}

impl RepoFetcher {
    pub fn new(policy: FetchPolicy, limits: RepoLimits) -> Self {
        Self { policy, limits }
    }

    pub fn limits(&self) -> &RepoLimits {
        &self.limits
    }

    /// Screen, clone, neuter, and collect
    pub async fn fetch(&self, url: &str, session: &SandboxSession) -> Result<Vec<RepoFile>> {
        let screened = self.policy.screen(url).await?;
        let dest = session.path().join("repo");

        self.clone_into(screened.as_str(), &dest).await?;
        log::info!("cloned {} into session {}", screened, session.id());

        let limits = self.limits.clone();
        let files = tokio::task::spawn_blocking(move || {
            strip_exec_bits(&dest)?;
            collect_text_files(&dest, &limits)
        })
        .await
        .map_err(|err| IngestError::CloneFailed(format!("collection task failed: {err}")))??;

        Ok(files)
    }

    async fn clone_into(&self, url: &str, dest: &Path) -> Result<()> {
        let mut cmd = Command::new("git");
        cmd.args([
            "-c",
            "protocol.file.allow=never",
            "-c",
            "protocol.ext.allow=never",
            "clone",
            "--depth",
            "1",
            "--single-branch",
            "--no-tags",
            "--",
        ])
        .arg(url)
        .arg(dest)
        .env("GIT_TERMINAL_PROMPT", "0")
        .env("GIT_LFS_SKIP_SMUDGE", "1")
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::piped())
        .kill_on_drop(true);

        let timeout = Duration::from_secs(self.limits.clone_timeout_secs);
        let child = cmd.spawn()?;
        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                if output.status.success() {
                    Ok(())
                } else {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    Err(IngestError::CloneFailed(stderr.trim().to_string()))
                }
            }
            Ok(Err(err)) => Err(err.into()),
            // kill_on_drop reaps the abandoned child
            Err(_) => Err(IngestError::FetchTimeout {
                seconds: self.limits.clone_timeout_secs,
            }),
        }
    }
}

/// Directories never worth collecting from
const IGNORED_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "target",
    "vendor",
    "third_party",
    "dist",
    "build",
    "__pycache__",
    ".venv",
];

#[cfg(unix)]
fn strip_exec_bits(root: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    for entry in walkdir::WalkDir::new(root) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                log::warn!("exec strip skipped an unreadable entry: {err}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let mode = entry
            .metadata()
            .map_err(std::io::Error::from)?
            .permissions()
            .mode();
        if mode & 0o111 != 0 {
            std::fs::set_permissions(
                entry.path(),
                std::fs::Permissions::from_mode(mode & !0o111),
            )?;
        }
    }
    Ok(())
}

#[cfg(not(unix))]
fn strip_exec_bits(_root: &Path) -> Result<()> {
    Ok(())
}

/// Walk the clone and read every plausibly-text file within budget
fn collect_text_files(root: &Path, limits: &RepoLimits) -> Result<Vec<RepoFile>> {
    let mut files = Vec::new();
    let mut total_bytes: u64 = 0;

    let scan_root = root.to_path_buf();
    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(true)
        .git_ignore(true)
        .git_global(false)
        .git_exclude(false);
    builder.filter_entry(move |entry| !in_ignored_dir(entry.path(), &scan_root));

    for result in builder.build() {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                log::warn!("failed to read entry: {err}");
                continue;
            }
        };
        let Some(file_type) = entry.file_type() else {
            continue;
        };
        if !file_type.is_file() {
            continue;
        }

        let path = entry.path();
        if let Ok(meta) = entry.metadata() {
            if meta.len() > limits.max_file_bytes {
                log::debug!(
                    "skipping large file {} ({} bytes > {})",
                    path.display(),
                    meta.len(),
                    limits.max_file_bytes
                );
                continue;
            }
        }

        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                log::warn!("failed to read {}: {err}", path.display());
                continue;
            }
        };
        if looks_binary(&bytes) {
            continue;
        }

        total_bytes += bytes.len() as u64;
        if total_bytes > limits.max_total_bytes {
            return Err(IngestError::OversizeRepository {
                limit: limits.max_total_bytes,
            });
        }
        if files.len() + 1 > limits.max_files {
            return Err(IngestError::TooManyFiles {
                limit: limits.max_files,
            });
        }

        let rel_path = path
            .strip_prefix(root)
            .unwrap_or(path)
            .to_string_lossy()
            .to_string();
        files.push(RepoFile {
            rel_path,
            text: String::from_utf8_lossy(&bytes).to_string(),
        });
    }

    // Stable order keeps downstream exports byte-stable
    files.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    log::info!("collected {} text files", files.len());
    Ok(files)
}

fn in_ignored_dir(path: &Path, root: &Path) -> bool {
    if let Ok(relative) = path.strip_prefix(root) {
        for component in relative.components() {
            if let std::path::Component::Normal(name) = component {
                let lowered = name.to_string_lossy().to_lowercase();
                if IGNORED_DIRS.iter().any(|ignored| ignored == &lowered) {
                    return true;
                }
            }
        }
    }
    false
}

/// NUL in the sniff window means binary
pub(crate) fn looks_binary(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(8192)];
    window.contains(&0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_collect_reads_text_and_skips_binary() {
        let temp = tempdir().unwrap();
        std::fs::create_dir_all(temp.path().join("src")).unwrap();
        std::fs::write(temp.path().join("src/main.rs"), "fn main() {}\n").unwrap();
        std::fs::write(temp.path().join("logo.png"), b"\x89PNG\x00\x1a").unwrap();

        let files = collect_text_files(temp.path(), &RepoLimits::default()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].rel_path, "src/main.rs");
        assert_eq!(files[0].text, "fn main() {}\n");
    }

    #[test]
    fn test_collect_skips_ignored_dirs_and_oversize_files() {
        let temp = tempdir().unwrap();
        std::fs::create_dir_all(temp.path().join("node_modules/pkg")).unwrap();
        std::fs::write(temp.path().join("node_modules/pkg/index.js"), "x").unwrap();
        std::fs::write(temp.path().join("keep.py"), "print(1)\n").unwrap();
        std::fs::write(temp.path().join("huge.txt"), "a".repeat(64)).unwrap();

        let limits = RepoLimits {
            max_file_bytes: 32,
            ..RepoLimits::default()
        };
        let files = collect_text_files(temp.path(), &limits).unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.rel_path.as_str()).collect();
        assert_eq!(paths, vec!["keep.py"]);
    }

    #[test]
    fn test_collect_enforces_total_budget() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join("a.txt"), "a".repeat(40)).unwrap();
        std::fs::write(temp.path().join("b.txt"), "b".repeat(40)).unwrap();

        let limits = RepoLimits {
            max_total_bytes: 64,
            ..RepoLimits::default()
        };
        let err = collect_text_files(temp.path(), &limits).unwrap_err();
        assert_eq!(err.reason_code(), "oversize-repository");
    }

    #[test]
    fn test_collect_enforces_file_count_cap() {
        let temp = tempdir().unwrap();
        for i in 0..3 {
            std::fs::write(temp.path().join(format!("f{i}.txt")), "x").unwrap();
        }

        let limits = RepoLimits {
            max_files: 2,
            ..RepoLimits::default()
        };
        let err = collect_text_files(temp.path(), &limits).unwrap_err();
        assert_eq!(err.reason_code(), "too-many-files");
    }

    #[test]
    fn test_collect_output_is_sorted() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join("zeta.md"), "z").unwrap();
        std::fs::write(temp.path().join("alpha.md"), "a").unwrap();

        let files = collect_text_files(temp.path(), &RepoLimits::default()).unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.rel_path.as_str()).collect();
        assert_eq!(paths, vec!["alpha.md", "zeta.md"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_strip_exec_bits() {
        use std::os::unix::fs::PermissionsExt;
        let temp = tempdir().unwrap();
        let script = temp.path().join("hook.sh");
        std::fs::write(&script, "#!/bin/sh\necho hi\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        strip_exec_bits(temp.path()).unwrap();
        let mode = std::fs::metadata(&script).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0);
    }
}
