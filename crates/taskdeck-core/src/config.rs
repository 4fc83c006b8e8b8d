use std::collections::BTreeMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use tracing::{
  debug,
  info,
  trace,
  warn
};

pub const DEFAULT_API_URL: &str =
  "http://localhost:3000/api";

const DEFAULTS: [(&str, &str); 3] = [
  ("api.url", DEFAULT_API_URL),
  ("data.location", "~/.taskdeck"),
  ("color", "on")
];

const RC_ENV: &str = "TASKDECKRC";
const RC_FILE_NAME: &str = ".taskdeckrc";

/// `key = value` settings: built-in defaults, then the rc file (and its
/// includes), then command-line overrides.
#[derive(Debug, Clone)]
pub struct Config {
  values:           BTreeMap<String, String>,
  pub loaded_files: Vec<PathBuf>
}

impl Config {
  pub fn defaults() -> Self {
    Self {
      values:       DEFAULTS
        .iter()
        .map(|(key, value)| {
          (
            key.to_string(),
            value.to_string()
          )
        })
        .collect(),
      loaded_files: vec![]
    }
  }

  #[tracing::instrument]
  pub fn load(
    rc_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Self::defaults();

    match resolve_rc_path(rc_override)? {
      | Some(path) => {
        info!(rc = %path.display(), "loading config file");
        cfg.read_file(&path)?;
      }
      | None => {
        debug!(
          "no config file; using \
           defaults"
        )
      }
    }

    Ok(cfg)
  }

  /// Keys may carry an `rc.` prefix, as typed on the command line.
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (key, value) in overrides {
      let key = key
        .strip_prefix("rc.")
        .map(str::to_string)
        .unwrap_or(key);
      debug!(key = %key, value = %value, "config override");
      self.values.insert(key, value);
    }
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<&str> {
    self
      .values
      .get(key)
      .map(String::as_str)
  }

  pub fn get_bool(
    &self,
    key: &str
  ) -> Option<bool> {
    self.get(key).map(parse_bool)
  }

  pub fn api_url(&self) -> &str {
    self
      .get("api.url")
      .unwrap_or(DEFAULT_API_URL)
  }

  /// Entries in key order.
  pub fn entries(
    &self
  ) -> impl Iterator<Item = (&str, &str)>
  {
    self.values.iter().map(
      |(key, value)| {
        (key.as_str(), value.as_str())
      }
    )
  }

  fn read_file(
    &mut self,
    path: &Path
  ) -> anyhow::Result<()> {
    let path = expand_tilde(path);
    let text = fs::read_to_string(
      &path
    )
    .with_context(|| {
      format!(
        "failed to read {}",
        path.display()
      )
    })?;
    self.loaded_files.push(path.clone());

    let dir = path
      .parent()
      .map(Path::to_path_buf)
      .unwrap_or_else(|| {
        PathBuf::from(".")
      });

    for (idx, raw_line) in
      text.lines().enumerate()
    {
      let line = strip_comment(raw_line);
      if line.is_empty() {
        continue;
      }

      if let Some(target) =
        line.strip_prefix("include ")
      {
        let include =
          resolve_include(&dir, target)?;
        if include.exists() {
          trace!(include = %include.display(), "following include");
          self.read_file(&include)?;
        } else {
          warn!(include = %include.display(), "include file missing; skipped");
        }
        continue;
      }

      let Some((key, value)) =
        line.split_once('=')
      else {
        return Err(anyhow!(
          "invalid config line {}:{}: \
           {}",
          path.display(),
          idx + 1,
          raw_line
        ));
      };

      self.values.insert(
        key.trim().to_string(),
        value.trim().to_string()
      );
    }

    Ok(())
  }
}

#[tracing::instrument(skip(cfg))]
pub fn resolve_data_dir(
  cfg: &Config,
  override_dir: Option<&Path>
) -> anyhow::Result<PathBuf> {
  let dir = match (
    override_dir,
    cfg.get("data.location")
  ) {
    | (Some(path), _) => {
      path.to_path_buf()
    }
    | (None, Some(location)) => {
      expand_tilde(Path::new(location))
    }
    | (None, None) => {
      home_dir()?.join(".taskdeck")
    }
  };

  if !dir.exists() {
    info!(dir = %dir.display(), "creating data directory");
    fs::create_dir_all(&dir)
      .with_context(|| {
        format!(
          "failed to create {}",
          dir.display()
        )
      })?;
  }

  Ok(dir)
}

fn resolve_rc_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(path.to_path_buf()));
  }

  if let Ok(from_env) =
    std::env::var(RC_ENV)
  {
    return Ok(
      (from_env != "/dev/null")
        .then(|| PathBuf::from(from_env))
    );
  }

  let candidate =
    home_dir()?.join(RC_FILE_NAME);
  Ok(candidate.exists().then_some(candidate))
}

fn resolve_include(
  dir: &Path,
  target: &str
) -> anyhow::Result<PathBuf> {
  let target = target.trim();
  if target.is_empty() {
    return Err(anyhow!(
      "include path cannot be empty"
    ));
  }

  let expanded =
    expand_tilde(Path::new(target));
  Ok(if expanded.is_absolute() {
    expanded
  } else {
    dir.join(expanded)
  })
}

fn strip_comment(line: &str) -> &str {
  line
    .split_once('#')
    .map_or(line, |(before, _)| before)
    .trim()
}

fn home_dir() -> anyhow::Result<PathBuf> {
  dirs::home_dir().ok_or_else(|| {
    anyhow!(
      "cannot determine home directory"
    )
  })
}

fn expand_tilde(path: &Path) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn parse_bool(value: &str) -> bool {
  matches!(
    value
      .trim()
      .to_ascii_lowercase()
      .as_str(),
    "1" | "y" | "yes" | "on" | "true"
  )
}
