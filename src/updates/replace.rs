//! Swapping a new executable into place.
//!
//! Unix can rename over a running binary; the old inode lives on until the
//! process exits. Windows locks the running image, so it has to be moved
//! aside first and deleted later by a detached helper.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{Result, ToolupError};
use crate::platform::Os;

use super::deferred_delete::schedule_delete;

/// The result of a replacement, carrying what still needs cleaning up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    /// The executable that now holds the new binary.
    pub target: PathBuf,
    /// The previous binary, when it had to be kept around.
    pub backup: Option<PathBuf>,
}

/// How a platform replaces a possibly running executable.
pub trait ReplaceStrategy: Send + Sync {
    /// Put the file at `new` in place of `target`.
    ///
    /// On error `target` is left holding the previous binary.
    fn replace(&self, new: &Path, target: &Path) -> Result<Replacement>;

    /// Release whatever `replace` left behind.
    fn finalize(&self, replacement: &Replacement) -> Result<()>;
}

/// Pick the replacement strategy for `os`.
pub fn for_os(os: Os) -> Box<dyn ReplaceStrategy> {
    if os.locks_running_executables() {
        Box::new(SwapAside::new())
    } else {
        Box::new(RenameOver)
    }
}

/// Like [`for_os`], deleting moved-aside binaries through `helper`.
///
/// Use this when the replaced executable is not toolup itself.
pub fn for_os_with_helper(os: Os, helper: &Path) -> Box<dyn ReplaceStrategy> {
    if os.locks_running_executables() {
        Box::new(SwapAside::with_helper(helper))
    } else {
        Box::new(RenameOver)
    }
}

fn sibling(target: &Path, suffix: &str) -> Result<PathBuf> {
    let name = target
        .file_name()
        .ok_or_else(|| ToolupError::Other(anyhow::anyhow!("{} has no file name", target.display())))?;
    Ok(target.with_file_name(format!(".{}.{}", name.to_string_lossy(), suffix)))
}

/// Stage `new` next to `target` so the final step is a same-directory rename.
///
/// A failed copy removes whatever it left at the staging path.
fn stage(new: &Path, target: &Path) -> Result<PathBuf> {
    let staged = sibling(target, "new")?;
    if let Err(e) = fs::copy(new, &staged) {
        let _ = fs::remove_file(&staged);
        return Err(e.into());
    }
    Ok(staged)
}

/// Atomic rename over the target (Unix).
#[derive(Debug, Clone, Copy, Default)]
pub struct RenameOver;

impl ReplaceStrategy for RenameOver {
    fn replace(&self, new: &Path, target: &Path) -> Result<Replacement> {
        let staged = stage(new, target)?;

        let result = (|| -> Result<()> {
            match fs::metadata(target) {
                Ok(metadata) => fs::set_permissions(&staged, metadata.permissions())?,
                Err(_) => crate::source::make_executable(&staged)?,
            }
            fs::File::open(&staged)?.sync_all()?;
            fs::rename(&staged, target)?;
            Ok(())
        })();

        if let Err(e) = result {
            let _ = fs::remove_file(&staged);
            return Err(e);
        }

        debug!("Renamed new binary over {}", target.display());
        Ok(Replacement {
            target: target.to_path_buf(),
            backup: None,
        })
    }

    fn finalize(&self, _replacement: &Replacement) -> Result<()> {
        Ok(())
    }
}

/// Rename the running target aside, move the new binary in, delete the old
/// one after exit (Windows).
#[derive(Debug, Clone, Default)]
pub struct SwapAside {
    helper: Option<PathBuf>,
}

impl SwapAside {
    /// Use the replaced executable itself as the cleanup helper.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `helper` for the deferred delete instead of the new binary.
    pub fn with_helper(helper: impl Into<PathBuf>) -> Self {
        Self {
            helper: Some(helper.into()),
        }
    }
}

impl ReplaceStrategy for SwapAside {
    fn replace(&self, new: &Path, target: &Path) -> Result<Replacement> {
        let staged = stage(new, target)?;
        let backup = sibling(target, "old")?;

        // Leftover from an earlier update whose cleanup never ran.
        if backup.exists() {
            let _ = fs::remove_file(&backup);
        }

        let moved_aside = target.exists();
        if moved_aside {
            if let Err(e) = fs::rename(target, &backup) {
                let _ = fs::remove_file(&staged);
                return Err(e.into());
            }
        }

        if let Err(e) = fs::rename(&staged, target) {
            if moved_aside {
                if let Err(restore) = fs::rename(&backup, target) {
                    warn!(
                        "Could not restore {} from {}: {}",
                        target.display(),
                        backup.display(),
                        restore
                    );
                }
            }
            let _ = fs::remove_file(&staged);
            return Err(e.into());
        }

        debug!(
            "Swapped new binary into {} (previous at {})",
            target.display(),
            backup.display()
        );
        Ok(Replacement {
            target: target.to_path_buf(),
            backup: moved_aside.then_some(backup),
        })
    }

    fn finalize(&self, replacement: &Replacement) -> Result<()> {
        let Some(backup) = &replacement.backup else {
            return Ok(());
        };

        let helper = self.helper.as_deref().unwrap_or(&replacement.target);
        match schedule_delete(backup, helper) {
            Ok(plan) => info!(
                "Old binary will be removed in the background (log: {})",
                plan.log_file().display()
            ),
            Err(e) => warn!(
                "Could not schedule removal of {}: {}; delete it manually",
                backup.display(),
                e
            ),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, PathBuf, PathBuf) {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("toolup");
        let new = temp.path().join("download");
        fs::write(&target, "old").unwrap();
        fs::write(&new, "new").unwrap();
        (temp, target, new)
    }

    #[test]
    fn for_os_picks_by_locking_behaviour() {
        // Both strategies are usable anywhere; only the choice differs.
        let (_temp, target, new) = setup();
        let replacement = for_os(Os::Linux).replace(&new, &target).unwrap();
        assert!(replacement.backup.is_none());

        let (_temp, target, new) = setup();
        let replacement = for_os(Os::Windows).replace(&new, &target).unwrap();
        assert!(replacement.backup.is_some());
    }

    #[test]
    fn rename_over_replaces_contents() {
        let (temp, target, new) = setup();
        let replacement = RenameOver.replace(&new, &target).unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "new");
        assert_eq!(replacement.target, target);
        assert!(!temp.path().join(".toolup.new").exists());
        assert!(RenameOver.finalize(&replacement).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn rename_over_keeps_target_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let (_temp, target, new) = setup();
        fs::set_permissions(&target, fs::Permissions::from_mode(0o750)).unwrap();
        fs::set_permissions(&new, fs::Permissions::from_mode(0o600)).unwrap();

        RenameOver.replace(&new, &target).unwrap();
        let mode = fs::metadata(&target).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o750);
    }

    #[cfg(unix)]
    #[test]
    fn rename_over_fresh_target_is_executable() {
        use std::os::unix::fs::PermissionsExt;

        let (_temp, target, new) = setup();
        fs::remove_file(&target).unwrap();
        RenameOver.replace(&new, &target).unwrap();
        let mode = fs::metadata(&target).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn rename_over_missing_source_leaves_target() {
        let (temp, target, _new) = setup();
        let missing = temp.path().join("missing");
        assert!(RenameOver.replace(&missing, &target).is_err());
        assert_eq!(fs::read_to_string(&target).unwrap(), "old");
    }

    #[test]
    fn failed_stage_leaves_no_partial_file() {
        let (temp, target, _new) = setup();
        let staged = temp.path().join(".toolup.new");
        fs::write(&staged, "partial").unwrap();

        let missing = temp.path().join("missing");
        assert!(stage(&missing, &target).is_err());
        assert!(!staged.exists());
        assert!(RenameOver.replace(&missing, &target).is_err());
        assert!(!staged.exists());
    }

    #[test]
    fn swap_aside_keeps_old_binary_as_backup() {
        let (temp, target, new) = setup();
        let replacement = SwapAside::new().replace(&new, &target).unwrap();

        let backup = temp.path().join(".toolup.old");
        assert_eq!(replacement.backup.as_deref(), Some(backup.as_path()));
        assert_eq!(fs::read_to_string(&target).unwrap(), "new");
        assert_eq!(fs::read_to_string(&backup).unwrap(), "old");
    }

    #[test]
    fn swap_aside_overwrites_stale_backup() {
        let (temp, target, new) = setup();
        let backup = temp.path().join(".toolup.old");
        fs::write(&backup, "stale").unwrap();

        SwapAside::new().replace(&new, &target).unwrap();
        assert_eq!(fs::read_to_string(&backup).unwrap(), "old");
    }

    #[test]
    fn swap_aside_missing_source_leaves_target() {
        let (temp, target, _new) = setup();
        let missing = temp.path().join("missing");
        assert!(SwapAside::new().replace(&missing, &target).is_err());
        assert_eq!(fs::read_to_string(&target).unwrap(), "old");
        assert!(!temp.path().join(".toolup.old").exists());
    }

    #[test]
    fn swap_aside_without_existing_target_has_no_backup() {
        let (_temp, target, new) = setup();
        fs::remove_file(&target).unwrap();
        let replacement = SwapAside::new().replace(&new, &target).unwrap();
        assert!(replacement.backup.is_none());
        assert!(SwapAside::new().finalize(&replacement).is_ok());
    }

    #[test]
    fn swap_aside_finalize_never_fails() {
        let (temp, target, new) = setup();
        let strategy = SwapAside::with_helper(temp.path().join("no-such-helper"));
        let replacement = strategy.replace(&new, &target).unwrap();
        assert!(strategy.finalize(&replacement).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn swap_aside_finalize_spawns_helper() {
        let (_temp, target, new) = setup();
        let strategy = SwapAside::with_helper("/bin/true");
        let replacement = strategy.replace(&new, &target).unwrap();
        assert!(strategy.finalize(&replacement).is_ok());
    }
}
