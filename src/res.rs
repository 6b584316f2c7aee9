//! Plain resources (downloads, PDFs, fonts) published under `/res`.

use crate::error::{Error, Result};
use crate::toolkit::{StaticPageUtils, resolve_source};
use std::path::Path;
use tracing::debug;

/// Resource handle, see [`StaticPageUtils::res`].
pub struct Res<'a> {
    pub(crate) kit: &'a StaticPageUtils,
}

impl Res<'_> {
    /// Publish `path` as `<webroot>/res/<file name>` and return its URL.
    ///
    /// On unix the published file is a symlink to the absolute source, so
    /// later edits show up without re-linking; elsewhere it is a copy. An
    /// existing entry is left alone.
    pub fn link(&self, path: impl AsRef<Path>) -> Result<String> {
        let source = resolve_source(path.as_ref())?;
        let file_name = source
            .file_name()
            .ok_or_else(|| Error::SourceNotFound(source.clone()))?
            .to_string_lossy()
            .to_string();

        let res_dir = self.kit.settings.res_dir();
        self.kit.ensure_dir(&res_dir)?;

        let target = res_dir.join(&file_name);
        if target.symlink_metadata().is_err() {
            publish(&source, &target)?;
            debug!("Created symlink for resource: {}", source.display());
        }
        Ok(format!("/res/{file_name}"))
    }
}

#[cfg(unix)]
fn publish(source: &Path, target: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(source, target)
}

#[cfg(not(unix))]
fn publish(source: &Path, target: &Path) -> std::io::Result<()> {
    std::fs::copy(source, target).map(|_| ())
}
