//! Script bundle loading.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{FutureExt, Shared};
use parking_lot::Mutex;
use tracing::debug;

use crate::error::{Result, RouterError};
use crate::route::{BoxFuture, Bundle};

/// How a script is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptKind {
    /// A classic script.
    Classic,
    /// `type="module"`.
    Module,
    /// `nomodule`, for hosts without module support.
    NoModule,
}

/// Loads scripts for the host.
pub trait BundleLoader: Send + Sync {
    /// Returns whether the host runs module scripts.
    fn supports_modules(&self) -> bool {
        true
    }

    /// Loads `src`; the error is a human-readable reason.
    fn load(&self, src: &str, kind: ScriptKind) -> BoxFuture<'static, std::result::Result<(), String>>;
}

type Pending = Shared<BoxFuture<'static, std::result::Result<(), String>>>;

/// Deduplicates bundle loads.
///
/// Concurrent and later requests for the same script share one load.
/// Failed loads are forgotten so that a later navigation retries them.
#[derive(Default)]
pub struct BundleCache {
    loader: Option<Arc<dyn BundleLoader>>,
    scripts: Mutex<HashMap<String, Pending>>,
}

impl BundleCache {
    /// Creates a cache over `loader`.
    ///
    /// Without a loader every bundle counts as loaded.
    pub fn new(loader: Option<Arc<dyn BundleLoader>>) -> Self {
        Self {
            loader,
            scripts: Mutex::new(HashMap::new()),
        }
    }

    /// Picks the script to load for `bundle`.
    pub fn select<'a>(&self, bundle: &'a Bundle) -> Option<(&'a str, ScriptKind)> {
        match bundle {
            Bundle::Script(src) => Some((src, ScriptKind::Classic)),
            Bundle::Modules { module, nomodule } => {
                let module = module.as_deref().map(|src| (src, ScriptKind::Module));
                let nomodule = nomodule.as_deref().map(|src| (src, ScriptKind::NoModule));
                let modules = self
                    .loader
                    .as_ref()
                    .map_or(true, |loader| loader.supports_modules());
                if modules {
                    module.or(nomodule)
                } else {
                    nomodule.or(module)
                }
            }
        }
    }

    /// Loads `bundle`, or waits for the load already in flight.
    pub async fn load(&self, bundle: &Bundle) -> Result<()> {
        let Some((src, kind)) = self.select(bundle) else {
            return Ok(());
        };
        let Some(loader) = &self.loader else {
            debug!(src, "no bundle loader configured, treating bundle as loaded");
            return Ok(());
        };

        let pending = {
            let mut scripts = self.scripts.lock();
            scripts
                .entry(src.to_string())
                .or_insert_with(|| loader.load(src, kind).shared())
                .clone()
        };

        match pending.await {
            Ok(()) => Ok(()),
            Err(reason) => {
                debug!(src, %reason, "bundle failed to load");
                self.scripts.lock().remove(src);
                Err(RouterError::BundleNotFound(src.to_string()))
            }
        }
    }
}

impl std::fmt::Debug for BundleCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BundleCache")
            .field("loader", &self.loader.is_some())
            .field("scripts", &self.scripts.lock().len())
            .finish()
    }
}
