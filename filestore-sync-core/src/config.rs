use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

/// Where the synchronised tree lives remotely and how it is tagged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilestoreConfig {
    /// Server root, e.g. `https://host:44300`. Trailing slashes are ignored.
    pub server: String,
    /// Root container (BSP application) name, possibly namespaced (`/NS/APP`).
    pub container: String,
    /// Description used when the container has to be created.
    pub container_description: String,
    /// Owning package every created object is assigned to.
    pub package: String,
    /// Transport request recorded on every mutating call, if any.
    #[serde(default)]
    pub transport: Option<String>,
    /// Logon language, sent upper-cased as `sap-language`.
    #[serde(default)]
    pub language: Option<String>,
}

impl FilestoreConfig {
    pub fn trace_loaded(&self) {
        info!(
            server = %self.server,
            container = %self.container,
            package = %self.package,
            transport = self.transport.as_deref().unwrap_or("-"),
            "Loaded filestore target"
        );
        debug!(?self, "Filestore target (full debug)");
    }
}

/// Per-run policy for [`crate::synchronise::synchronise`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SynchroniseConfig {
    /// Local directory the selected relative paths are resolved against.
    pub base_dir: PathBuf,
    /// Keep remote artifacts that are not part of the local selection.
    #[serde(default)]
    pub preserve_unselected: bool,
    /// Trigger the application index recalculation after a successful run.
    #[serde(default)]
    pub recalculate_index: bool,
}

impl SynchroniseConfig {
    pub fn trace_loaded(&self) {
        info!(
            base_dir = %self.base_dir.display(),
            preserve_unselected = self.preserve_unselected,
            recalculate_index = self.recalculate_index,
            "Loaded synchronise policy"
        );
    }
}
