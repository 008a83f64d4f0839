//! Crash-safe file persistence.

use std::io::Write;
use std::path::Path;

/// Writes `contents` to `path` atomically.
///
/// The data goes to a temporary sibling first and is renamed into place, so
/// a crash mid-write cannot corrupt previously committed state.
pub(crate) fn atomic_write(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("tmp");
    {
        let mut file = std::fs::File::create(&tmp)?;
        file.write_all(contents)?;
        file.sync_all()?;
    }
    std::fs::rename(&tmp, path)
}
