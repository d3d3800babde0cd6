use crate::env::EnvLoader;
use crate::error::CopreError;
use crate::file::FileLoader;
use crate::flags::{FlagLoader, FlagStore};
use crate::loader::{Loader, load};
use crate::record::Record;

/// Entry point for building a layered load.
pub struct Copre;

impl Copre {
    pub fn builder<R: Record + Default>(dst: &mut R) -> Builder<'_, R> {
        Builder {
            dst,
            loaders: Vec::new(),
        }
    }
}

/// Collects loaders in precedence order, lowest first, then runs them with
/// [`build()`](Self::build).
///
/// ```ignore
/// let mut config = Config { port: 8080, ..Config::default() };
/// Copre::builder(&mut config)
///     .file(FileLoader::toml("app.toml").ignore_not_found(true))
///     .env(EnvLoader::new().prefix("APP"))
///     .flags(&flags)
///     .build()?;
/// ```
///
/// Nothing is implicit: a source only takes part if it is added, and its
/// position in the chain is the only thing deciding what it overrides.
pub struct Builder<'a, R> {
    dst: &'a mut R,
    loaders: Vec<Box<dyn Loader<R> + 'a>>,
}

impl<'a, R: Record + Default + 'a> Builder<'a, R> {
    pub fn file(self, loader: FileLoader<R>) -> Self {
        self.loader(loader)
    }

    pub fn env(self, loader: EnvLoader) -> Self {
        self.loader(loader)
    }

    /// Flags the user passed on the command line.
    pub fn flags(self, store: &'a dyn FlagStore) -> Self {
        self.loader(FlagLoader::new(store))
    }

    pub fn flags_with(self, loader: FlagLoader<'a>) -> Self {
        self.loader(loader)
    }

    /// Like [`flags()`](Self::flags), and additionally use the store's
    /// default values as the very first source, so they rank just above
    /// whatever `dst` already holds and below every other source.
    pub fn flags_with_defaults(mut self, store: &'a dyn FlagStore) -> Self {
        let defaults = FlagLoader::new(store).include_unchanged(true);
        self.loaders.insert(0, Box::new(defaults));
        self.flags(store)
    }

    /// Any other source, including closures `Fn(&mut R) -> Result<(), CopreError>`.
    pub fn loader(mut self, loader: impl Loader<R> + 'a) -> Self {
        self.loaders.push(Box::new(loader));
        self
    }

    /// Run every loader in order and merge the results into the destination.
    pub fn build(self) -> Result<(), CopreError> {
        let loaders: Vec<&dyn Loader<R>> = self.loaders.iter().map(|l| &**l).collect();
        load(self.dst, &loaders)
    }
}
