//! Config file discovery and loading.
//!
//! A [`FileLoader`] has one primary path plus an ordered list of
//! [`SearchPath`]s. Candidates are the primary path, then the primary path's
//! file name under each search location, in order:
//!
//! ```text
//! ./app.toml                     primary
//! /etc/app/app.toml              SearchPath::Path("/etc/app")
//! ~/.config/app/app.toml         SearchPath::Platform("app")
//! ```
//!
//! By default only the first candidate that exists is decoded. With
//! [`merge_all`](FileLoader::merge_all) every existing candidate is decoded
//! into the same snapshot in candidate order, so later files override fields
//! set by earlier ones.
//!
//! Missing candidates are skipped. Any other I/O error, and every decode
//! error, is fatal and tagged with the offending path; `ignore_not_found` only
//! covers the case where no candidate exists at all.

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::decode::{Decode, Json, Toml};
use crate::env::{EnvSource, ProcessEnv};
use crate::error::CopreError;
use crate::loader::Loader;
use crate::record::Record;

/// A directory to look for the config file in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchPath {
    /// An explicit directory.
    Path(PathBuf),
    /// Current working directory.
    Cwd,
    /// A subdirectory under the user's home directory, e.g. `Home(".myapp")`.
    Home(&'static str),
    /// The platform config directory for the named application (XDG on
    /// Linux, `~/Library/Application Support` on macOS).
    Platform(String),
}

impl SearchPath {
    /// The concrete directory, or `None` if it can not be determined on this
    /// system (no home directory, unreadable working directory).
    pub fn resolve(&self) -> Option<PathBuf> {
        match self {
            SearchPath::Path(dir) => Some(dir.clone()),
            SearchPath::Cwd => std::env::current_dir().ok(),
            SearchPath::Home(subdir) => {
                let user = directories::UserDirs::new()?;
                Some(user.home_dir().join(subdir))
            }
            SearchPath::Platform(app_name) => {
                let proj = directories::ProjectDirs::from("", "", app_name)?;
                Some(proj.config_dir().to_path_buf())
            }
        }
    }
}

/// Populates a snapshot by decoding one or more config files.
pub struct FileLoader<R> {
    path: PathBuf,
    decoder: Box<dyn Decode<R>>,
    ignore_not_found: bool,
    expand_env: bool,
    merge_all: bool,
    search_paths: Vec<SearchPath>,
    env: Box<dyn EnvSource>,
}

impl<R> FileLoader<R> {
    pub fn new(path: impl Into<PathBuf>, decoder: impl Decode<R> + 'static) -> Self {
        Self {
            path: path.into(),
            decoder: Box::new(decoder),
            ignore_not_found: false,
            expand_env: false,
            merge_all: false,
            search_paths: Vec::new(),
            env: Box::new(ProcessEnv),
        }
    }

    /// Succeed without touching the snapshot when no candidate file exists.
    pub fn ignore_not_found(mut self, ignore: bool) -> Self {
        self.ignore_not_found = ignore;
        self
    }

    /// Substitute `$VAR` and `${VAR}` references before decoding. Unset
    /// variables expand to the empty string.
    pub fn expand_env(mut self, expand: bool) -> Self {
        self.expand_env = expand;
        self
    }

    /// Decode every candidate that exists instead of stopping at the first.
    pub fn merge_all(mut self, merge_all: bool) -> Self {
        self.merge_all = merge_all;
        self
    }

    /// Also look for the primary file name in `search_path`.
    pub fn search_path(mut self, search_path: SearchPath) -> Self {
        self.search_paths.push(search_path);
        self
    }

    pub fn search_paths(mut self, search_paths: impl IntoIterator<Item = SearchPath>) -> Self {
        self.search_paths.extend(search_paths);
        self
    }

    /// Where variable references are resolved from when expanding.
    pub fn env_source(mut self, env: impl EnvSource + 'static) -> Self {
        self.env = Box::new(env);
        self
    }

    /// Every path this loader would try, in order. Search locations that do
    /// not resolve on this system are left out.
    pub fn candidates(&self) -> Vec<PathBuf> {
        let mut candidates = vec![self.path.clone()];
        let Some(file_name) = self.path.file_name() else {
            return candidates;
        };
        candidates.extend(
            self.search_paths
                .iter()
                .filter_map(|sp| match sp.resolve() {
                    Some(dir) => Some(dir.join(file_name)),
                    None => {
                        trace!(search_path = ?sp, "search path does not resolve, skipping");
                        None
                    }
                }),
        );
        candidates
    }

    fn expand(&self, bytes: Vec<u8>, path: &Path) -> Result<Vec<u8>, CopreError> {
        let text = String::from_utf8(bytes).map_err(|e| CopreError::Decode {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;
        let expanded = shellexpand::env_with_context_no_errors(&text, |name: &str| {
            Some(self.env.get(name).unwrap_or_default())
        });
        Ok(expanded.into_owned().into_bytes())
    }
}

impl<R: Record + DeserializeOwned + 'static> FileLoader<R> {
    /// A loader decoding TOML.
    pub fn toml(path: impl Into<PathBuf>) -> Self {
        Self::new(path, Toml::new())
    }

    /// A loader decoding JSON.
    pub fn json(path: impl Into<PathBuf>) -> Self {
        Self::new(path, Json)
    }
}

impl<R> fmt::Debug for FileLoader<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileLoader")
            .field("path", &self.path)
            .field("ignore_not_found", &self.ignore_not_found)
            .field("expand_env", &self.expand_env)
            .field("merge_all", &self.merge_all)
            .field("search_paths", &self.search_paths)
            .finish_non_exhaustive()
    }
}

impl<R: Record> Loader<R> for FileLoader<R> {
    fn load(&self, dst: &mut R) -> Result<(), CopreError> {
        let candidates = self.candidates();
        let mut decoded = 0;
        for candidate in &candidates {
            let bytes = match std::fs::read(candidate) {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    trace!(path = %candidate.display(), "config file not found");
                    continue;
                }
                Err(source) => {
                    return Err(CopreError::Io {
                        path: candidate.clone(),
                        source,
                    });
                }
            };
            let bytes = if self.expand_env {
                self.expand(bytes, candidate)?
            } else {
                bytes
            };
            debug!(path = %candidate.display(), "decoding config file");
            self.decoder
                .decode(&bytes, dst)
                .map_err(|source| CopreError::Decode {
                    path: candidate.clone(),
                    source,
                })?;
            decoded += 1;
            if !self.merge_all {
                break;
            }
        }

        if decoded == 0 {
            if self.ignore_not_found {
                debug!(path = %self.path.display(), "no config file found, ignoring");
                return Ok(());
            }
            return Err(CopreError::NotFound { candidates });
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "file"
    }
}
