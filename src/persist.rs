// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! File I/O for the backing store.
use std::{
    ffi::OsString,
    fs, io,
    path::{Path, PathBuf},
};

/// Reads the backing file, returning `None` if it does not exist.
pub(crate) fn read_if_exists(path: &Path) -> io::Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Replaces the file at `path` with `bytes`.
///
/// Writes to a sibling temp file first and renames it over the target, so readers observe either
/// the previous content or the new content, never a partial write.
pub(crate) fn atomic_write(path: &Path, bytes: &[u8], create_dirs: bool) -> io::Result<()> {
    if create_dirs && let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let temp = temp_path(path);
    if let Err(e) = fs::write(&temp, bytes).and_then(|()| fs::rename(&temp, path)) {
        // the write error is the one worth reporting
        let _ = fs::remove_file(&temp);
        return Err(e);
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("store"));
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_reads_as_none() {
        let dir = TempDir::new().unwrap();
        assert_eq!(read_if_exists(&dir.path().join("nope.json")).unwrap(), None);
    }

    #[test]
    fn write_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.json");
        atomic_write(&path, b"{}", false).unwrap();
        atomic_write(&path, b"{\"a\":1}", false).unwrap();
        assert_eq!(read_if_exists(&path).unwrap().unwrap(), b"{\"a\":1}");
    }

    #[test]
    fn creates_parent_directories_when_asked() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("a.json");
        assert!(atomic_write(&path, b"{}", false).is_err());
        atomic_write(&path, b"{}", true).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn no_temp_files_are_left_behind() {
        let dir = TempDir::new().unwrap();
        atomic_write(&dir.path().join("a.json"), b"{}", false).unwrap();
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, [OsString::from("a.json")]);
    }

    #[test]
    fn temp_file_is_a_sibling() {
        assert_eq!(
            temp_path(Path::new("dir/a.json")),
            PathBuf::from("dir/a.json.tmp")
        );
    }
}
