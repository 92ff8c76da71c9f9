use crate::document::{Provenance, RawDocument, SourceType};
use crate::error::{IngestError, Result};
use crate::paths::sanitize_file_name;
use crate::policy::FetchPolicy;
use crate::repo::{looks_binary, RepoFetcher, RepoLimits};
use crate::session::{SandboxManager, SandboxSession};
use serde::{Deserialize, Serialize};

/// Caps on paste and single-file ingests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestLimits {
    pub max_upload_bytes: u64,
    pub repo: RepoLimits,
}

impl Default for IngestLimits {
    fn default() -> Self {
        Self {
            max_upload_bytes: 2 * 1024 * 1024,
            repo: RepoLimits::default(),
        }
    }
}

/// Documents from one ingest plus the session that staged them
///
/// Dropping the batch wipes the session; [`IngestBatch::close`] wipes it
/// eagerly and reports failures. Pasted text never touches disk, so its
/// batch carries no session.
#[derive(Debug)]
pub struct IngestBatch {
    pub documents: Vec<RawDocument>,
    pub session: Option<SandboxSession>,
}

impl IngestBatch {
    pub fn close(self) -> Result<()> {
        if let Some(session) = self.session {
            session.close()?;
        }
        Ok(())
    }
}

/// The only doorway through which outside content reaches the pipeline
///
/// Every operation either returns sanitized in-memory documents or a
/// refusal from the error taxonomy; nothing downstream ever sees a raw
/// upload name, an unscreened URL, or a file outside a session.
pub struct IngestBoundary {
    manager: SandboxManager,
    fetcher: RepoFetcher,
    limits: IngestLimits,
}

impl IngestBoundary {
    pub fn new(manager: SandboxManager, policy: FetchPolicy, limits: IngestLimits) -> Self {
        let fetcher = RepoFetcher::new(policy, limits.repo.clone());
        Self {
            manager,
            fetcher,
            limits,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(
            SandboxManager::system_default(),
            FetchPolicy::default(),
            IngestLimits::default(),
        )
    }

    pub fn limits(&self) -> &IngestLimits {
        &self.limits
    }

    pub fn manager(&self) -> &SandboxManager {
        &self.manager
    }

    /// Pasted text, validated in memory
    pub fn ingest_text(&self, text: &str) -> Result<IngestBatch> {
        if text.trim().is_empty() {
            return Err(IngestError::EmptyUpload);
        }
        if text.len() as u64 > self.limits.max_upload_bytes {
            return Err(IngestError::OversizeUpload {
                limit: self.limits.max_upload_bytes,
            });
        }

        let provenance = Provenance::new(SourceType::PastedText, "paste", None, text);
        Ok(IngestBatch {
            documents: vec![RawDocument::new(None, text.to_string(), provenance)],
            session: None,
        })
    }

    /// One uploaded file, staged through a fresh session
    pub fn ingest_file(&self, name: &str, bytes: &[u8]) -> Result<IngestBatch> {
        if bytes.is_empty() {
            return Err(IngestError::EmptyUpload);
        }
        if bytes.len() as u64 > self.limits.max_upload_bytes {
            return Err(IngestError::OversizeUpload {
                limit: self.limits.max_upload_bytes,
            });
        }

        let clean = sanitize_file_name(name)?;
        if !is_supported_upload(clean) || looks_binary(bytes) {
            return Err(IngestError::UnsupportedFileType {
                name: clean.to_string(),
            });
        }

        let session = self.manager.create_session()?;
        session.write_upload(clean, bytes)?;

        let text = String::from_utf8_lossy(bytes).to_string();
        let provenance =
            Provenance::new(SourceType::UploadedFile, clean, Some(session.id()), &text);
        Ok(IngestBatch {
            documents: vec![RawDocument::new(Some(clean.to_string()), text, provenance)],
            session: Some(session),
        })
    }

    /// Clone a screened repository URL and lift out its text files
    pub async fn ingest_repository(&self, url: &str) -> Result<IngestBatch> {
        let session = self.manager.create_session()?;
        let files = match self.fetcher.fetch(url, &session).await {
            Ok(files) => files,
            Err(err) => {
                // The failure path wipes too, and says so if it cannot
                if let Err(close_err) = session.close() {
                    log::warn!("session wipe after failed fetch: {close_err}");
                }
                return Err(err);
            }
        };

        let documents = files
            .into_iter()
            .map(|file| {
                let provenance =
                    Provenance::new(SourceType::Repository, url, Some(session.id()), &file.text);
                RawDocument::new(Some(file.rel_path), file.text, provenance)
            })
            .collect();
        Ok(IngestBatch {
            documents,
            session: Some(session),
        })
    }
}

/// Upload names accepted without an extension
const UPLOAD_BARE_NAMES: &[&str] = &["Dockerfile", "Makefile", "Justfile", "Gemfile", "Rakefile"];

/// Upload extensions accepted for ingestion
const UPLOAD_EXTENSIONS: &[&str] = &[
    // languages
    "rs", "py", "pyw", "js", "mjs", "cjs", "ts", "tsx", "jsx", "go", "java", "kt", "c", "h",
    "cpp", "cc", "hpp", "cs", "rb", "swift", "php", "scala", "lua", "ex", "exs",
    // scripts
    "sh", "bash", "zsh", "ps1", "bat",
    // docs
    "md", "mdx", "rst", "txt", "adoc",
    // config / data
    "yaml", "yml", "json", "toml", "ini", "cfg", "conf", "properties", "env", "xml", "html",
    "css", "scss", "sql", "proto", "tf", "hcl",
];

fn is_supported_upload(name: &str) -> bool {
    if UPLOAD_BARE_NAMES
        .iter()
        .any(|bare| name.eq_ignore_ascii_case(bare))
    {
        return true;
    }
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            let ext = ext.to_lowercase();
            UPLOAD_EXTENSIONS.iter().any(|candidate| candidate == &ext)
        }
        _ => false,
    }
}
