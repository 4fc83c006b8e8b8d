use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, anyhow};
use parking_lot::RwLock;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Authentication context handed to the repositories. Clones share the same
/// token, so a login through one handle is visible to every repository.
#[derive(Debug, Clone, Default)]
pub struct Session {
    token: Arc<RwLock<Option<String>>>,
}

impl Session {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: Arc::new(RwLock::new(token)),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.read().is_some()
    }

    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write() = Some(token.into());
    }

    pub fn clear(&self) {
        *self.token.write() = None;
    }

    /// Header value for the current token. Without a token the literal
    /// `null` is sent and the server answers 401.
    pub fn authorization(&self) -> String {
        match self.token.read().as_deref() {
            Some(token) => format!("Bearer {token}"),
            None => "Bearer null".to_string(),
        }
    }
}

/// Persists the session token between invocations.
#[derive(Debug)]
pub struct SessionStore {
    pub token_path: PathBuf,
}

impl SessionStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let token_path = data_dir.join("session.token");
        info!(token = %token_path.display(), "opened session store");
        Ok(Self { token_path })
    }

    #[tracing::instrument(skip(self))]
    pub fn load(&self) -> anyhow::Result<Session> {
        if !self.token_path.exists() {
            debug!("no stored session");
            return Ok(Session::anonymous());
        }

        let raw = fs::read_to_string(&self.token_path)
            .with_context(|| format!("failed reading {}", self.token_path.display()))?;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Ok(Session::anonymous())
        } else {
            Ok(Session::new(Some(trimmed.to_string())))
        }
    }

    #[tracing::instrument(skip(self, session))]
    pub fn save(&self, session: &Session) -> anyhow::Result<()> {
        let Some(token) = session.token() else {
            return self.clear();
        };

        let dir = self.token_path.parent().unwrap_or_else(|| Path::new("."));
        let mut temp = NamedTempFile::new_in(dir)?;
        writeln!(temp, "{token}")?;
        temp.flush()?;
        temp.persist(&self.token_path).map_err(|err| {
            anyhow!("failed to persist {}: {}", self.token_path.display(), err)
        })?;

        debug!(file = %self.token_path.display(), "session token saved");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub fn clear(&self) -> anyhow::Result<()> {
        if self.token_path.exists() {
            fs::remove_file(&self.token_path)
                .with_context(|| format!("failed removing {}", self.token_path.display()))?;
        }
        Ok(())
    }
}
