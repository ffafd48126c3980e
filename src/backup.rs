use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum BackupName {
    /// `<dir>/<file name>`, replaced on every run.
    #[default]
    SameName,
    /// `<dir>/<file name>.backup.<YYYYmmdd_HHMMSS>`
    Timestamped,
}

/// Copy `path` into `dir` before it gets overwritten.
pub fn backup_file(path: &Path, dir: &Path, naming: BackupName) -> Result<PathBuf> {
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("{} has no file name", path.display()))?
        .to_string_lossy();

    let target = match naming {
        BackupName::SameName => dir.join(&*file_name),
        BackupName::Timestamped => {
            let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
            dir.join(format!("{file_name}.backup.{stamp}"))
        }
    };

    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create backup dir {}", dir.display()))?;
    fs::copy(path, &target)
        .with_context(|| format!("failed to back up {} to {}", path.display(), target.display()))?;

    Ok(target)
}

/// Back up `path`, then replace its contents.
pub fn write_with_backup(
    path: &Path,
    contents: &str,
    dir: &Path,
    naming: BackupName,
) -> Result<PathBuf> {
    let backup = backup_file(path, dir, naming)?;
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(backup)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_with_backup_should_keep_original() {
        let tmp = tempfile::tempdir().unwrap();
        let page = tmp.path().join("page.astro");
        fs::write(&page, "old").unwrap();

        let backups = tmp.path().join("backups/nested");
        let backup = write_with_backup(&page, "new", &backups, BackupName::SameName).unwrap();

        assert_eq!(backup, backups.join("page.astro"));
        assert_eq!(fs::read_to_string(&backup).unwrap(), "old");
        assert_eq!(fs::read_to_string(&page).unwrap(), "new");
    }

    #[test]
    fn timestamped_backup_should_carry_suffix() {
        let tmp = tempfile::tempdir().unwrap();
        let page = tmp.path().join("index.astro");
        fs::write(&page, "home").unwrap();

        let backup = backup_file(&page, tmp.path(), BackupName::Timestamped).unwrap();
        let name = backup.file_name().unwrap().to_string_lossy().to_string();

        assert!(name.starts_with("index.astro.backup."));
        // YYYYmmdd_HHMMSS
        assert_eq!(name.len(), "index.astro.backup.".len() + 15);
        assert_eq!(fs::read_to_string(&backup).unwrap(), "home");
    }

    #[test]
    fn missing_source_should_fail() {
        let tmp = tempfile::tempdir().unwrap();
        let err = backup_file(&tmp.path().join("nope.astro"), tmp.path(), BackupName::SameName)
            .unwrap_err();
        assert!(err.to_string().contains("failed to back up"));
    }
}
