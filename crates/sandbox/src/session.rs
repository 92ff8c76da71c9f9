use crate::error::Result;
use crate::paths::{contained_join, sanitize_file_name};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;
use uuid::Uuid;

/// Directory name prefix for sandbox sessions, also used by the sweeper
const SESSION_PREFIX: &str = "codesift-session-";

/// Creates and reaps sandbox sessions under one root directory
pub struct SandboxManager {
    root: PathBuf,
}

impl SandboxManager {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Sessions under the system temp directory
    pub fn system_default() -> Self {
        Self::new(std::env::temp_dir().join("codesift"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn create_session(&self) -> Result<SandboxSession> {
        std::fs::create_dir_all(&self.root)?;
        let dir = tempfile::Builder::new()
            .prefix(SESSION_PREFIX)
            .tempdir_in(&self.root)?;
        let id = Uuid::new_v4();
        log::debug!("opened sandbox session {id} at {}", dir.path().display());
        Ok(SandboxSession {
            id,
            dir,
            created_at: SystemTime::now(),
        })
    }

    /// Remove leftover session directories from crashed runs
    ///
    /// Only directories carrying the session prefix are touched. Sessions
    /// younger than `older_than` are left alone so a concurrent process is
    /// never swept out from under itself.
    pub fn sweep_stale(&self, older_than: Duration) -> Result<usize> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(err) => return Err(err.into()),
        };

        let mut removed = 0;
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if !name.starts_with(SESSION_PREFIX) {
                continue;
            }

            let age = entry
                .metadata()
                .and_then(|meta| meta.modified())
                .ok()
                .and_then(|modified| modified.elapsed().ok())
                // Unreadable or skewed timestamps count as fresh
                .unwrap_or(Duration::ZERO);
            if age < older_than {
                continue;
            }

            std::fs::remove_dir_all(entry.path())?;
            log::info!("swept stale sandbox session {name}");
            removed += 1;
        }
        Ok(removed)
    }
}

/// One isolated workspace for a single ingest
///
/// The backing directory is wiped when the session is dropped, on every
/// exit path; [`SandboxSession::close`] wipes eagerly and surfaces the IO
/// error instead of swallowing it.
#[derive(Debug)]
pub struct SandboxSession {
    id: Uuid,
    dir: TempDir,
    created_at: SystemTime,
}

impl SandboxSession {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn age(&self) -> Duration {
        self.created_at.elapsed().unwrap_or(Duration::ZERO)
    }

    /// Write upload bytes into the session under a validated name
    ///
    /// The file is created without execute permission; sandbox content is
    /// data, never a program.
    pub fn write_upload(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let clean = sanitize_file_name(name)?;
        let dest = contained_join(self.path(), clean)?;
        std::fs::write(&dest, bytes)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&dest, std::fs::Permissions::from_mode(0o600))?;
        }
        Ok(dest)
    }

    /// Wipe the session now and report failures
    pub fn close(self) -> Result<()> {
        let id = self.id;
        self.dir.close()?;
        log::debug!("sandbox session {id} wiped");
        Ok(())
    }
}
