use std::collections::{BTreeMap, HashMap};

use tracing::{debug, trace};

use crate::convert::Converter;
use crate::error::CopreError;
use crate::loader::Loader;
use crate::naming;
use crate::record::{Field, FieldPath, Record};
use crate::value::{Kind, Value};
use crate::walk::walk;

/// Read-only lookup of environment variables by exact name.
///
/// Loaders take this instead of reading `std::env` directly so tests can pass
/// synthetic data and run concurrently.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;
}

/// The real process environment. Variables that are not valid UTF-8 read as
/// unset.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

impl EnvSource for BTreeMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        BTreeMap::get(self, key).cloned()
    }
}

type KeyFn = Box<dyn Fn(&FieldPath) -> String>;

/// Populates a snapshot from environment variables.
///
/// Each leaf field's variable name is its `env` annotation, or else the
/// computed key for its path ([`naming::upper_snake_case`] unless replaced
/// with [`key_with`](Self::key_with)). The prefix is joined with `_` unless the
/// annotation says `noprefix`:
///
/// ```text
/// env:"NAME[,hex|base64][,noprefix]"
/// ```
///
/// `hex` and `base64` decode the variable into bytes and are only accepted on
/// byte-sequence fields. Unset variables leave the field alone.
pub struct EnvLoader {
    prefix: String,
    key_fn: KeyFn,
    converter: Converter,
    source: Box<dyn EnvSource>,
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            key_fn: Box::new(naming::upper_snake_case),
            converter: Converter::default(),
            source: Box::new(ProcessEnv),
        }
    }
}

impl EnvLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepended to every key as `{prefix}_{key}`. Empty means no prefix.
    pub fn prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    /// Replace the key computation, e.g. with another function from
    /// [`naming`].
    pub fn key_with(mut self, key_fn: impl Fn(&FieldPath) -> String + 'static) -> Self {
        self.key_fn = Box::new(key_fn);
        self
    }

    pub fn converter(mut self, converter: Converter) -> Self {
        self.converter = converter;
        self
    }

    /// Read variables from `source` instead of the process environment.
    pub fn source(mut self, source: impl EnvSource + 'static) -> Self {
        self.source = Box::new(source);
        self
    }

    fn lookup(
        &self,
        path: &FieldPath,
        field: &Field,
        kind: &Kind,
    ) -> Result<Option<Value>, CopreError> {
        let mut key = (self.key_fn)(path);
        let mut target = kind.clone();
        let mut noprefix = false;

        if let Some(tag) = field.tag("env") {
            let mut params = tag.split(',');
            if let Some(name) = params.next().filter(|name| !name.is_empty()) {
                key = name.to_string();
            }
            for option in params {
                match option {
                    "hex" | "base64" => {
                        if !kind.is_bytes() {
                            return Err(CopreError::UnsupportedOption {
                                path: path.to_string(),
                                option: option.to_string(),
                                kind: kind.clone(),
                            });
                        }
                        target = if option == "hex" {
                            Kind::HexBytes
                        } else {
                            Kind::Base64Bytes
                        };
                    }
                    "noprefix" => noprefix = true,
                    other => trace!(path = %path, option = other, "ignoring unknown env option"),
                }
            }
        }

        if !self.prefix.is_empty() && !noprefix {
            key = format!("{}_{key}", self.prefix);
        }

        let Some(raw) = self.source.get(&key) else {
            trace!(path = %path, key = %key, "env var not set");
            return Ok(None);
        };
        debug!(path = %path, key = %key, "resolved from environment");
        self.converter
            .convert(&target, &raw)
            .map(Some)
            .map_err(|source| CopreError::Convert {
                path: path.to_string(),
                source,
            })
    }
}

impl<R: Record> Loader<R> for EnvLoader {
    fn load(&self, dst: &mut R) -> Result<(), CopreError> {
        walk(dst, |path, field, kind| self.lookup(path, field, kind))
    }

    fn name(&self) -> &str {
        "env"
    }
}
