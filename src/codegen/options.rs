use crate::discovery::Module;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::time::Instant;

/// Maps a module to the directory its client is generated into.
pub type OutputResolver = Arc<dyn Fn(&Module) -> PathBuf + Send + Sync>;

#[derive(Clone)]
pub struct WebClientOptions {
    pub(crate) out: OutputResolver,
    pub(crate) include_third_party: bool,
}

/// Which generation modes run, and with what settings. Modes not enabled are
/// skipped; nothing enabled makes generation a no-op.
#[derive(Clone, Default)]
pub struct GenerateOptions {
    pub(crate) native_import_path: Option<String>,
    pub(crate) web_client: Option<WebClientOptions>,
    pub(crate) store_root: Option<PathBuf>,
    pub(crate) include_dirs: Vec<PathBuf>,
    pub(crate) deadline: Option<Instant>,
}

impl GenerateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates Go bindings into the project whose module path is `import_path`.
    pub fn with_native_binding_generation(mut self, import_path: impl Into<String>) -> Self {
        self.native_import_path = Some(import_path.into());
        self
    }

    /// Generates a TypeScript client per module into `out(module)`. With
    /// `include_third_party`, modules of every Go dependency are generated too.
    pub fn with_web_client_generation<F>(mut self, include_third_party: bool, out: F) -> Self
    where
        F: Fn(&Module) -> PathBuf + Send + Sync + 'static,
    {
        self.web_client = Some(WebClientOptions {
            out: Arc::new(out),
            include_third_party,
        });
        self
    }

    /// Web client generation plus a store wrapper per module and a root
    /// loader at `store_root`.
    pub fn with_state_store_generation<F>(
        self,
        include_third_party: bool,
        out: F,
        store_root: impl Into<PathBuf>,
    ) -> Self
    where
        F: Fn(&Module) -> PathBuf + Send + Sync + 'static,
    {
        let mut options = self.with_web_client_generation(include_third_party, out);
        options.store_root = Some(store_root.into());
        options
    }

    /// Extra schema search paths, relative to each source path.
    pub fn with_include_dirs<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.include_dirs.extend(dirs.into_iter().map(Into::into));
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn native_import_path(&self) -> Option<&str> {
        self.native_import_path.as_deref()
    }

    pub fn store_root(&self) -> Option<&Path> {
        self.store_root.as_deref()
    }

    pub fn is_noop(&self) -> bool {
        self.native_import_path.is_none() && self.web_client.is_none()
    }
}

impl fmt::Debug for GenerateOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerateOptions")
            .field("native_import_path", &self.native_import_path)
            .field("web_client", &self.web_client.is_some())
            .field(
                "include_third_party",
                &self.web_client.as_ref().map(|w| w.include_third_party),
            )
            .field("store_root", &self.store_root)
            .field("include_dirs", &self.include_dirs)
            .field("deadline", &self.deadline)
            .finish()
    }
}
