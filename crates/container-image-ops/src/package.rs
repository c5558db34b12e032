use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// An image serialized to a tar archive inside its own temporary directory.
///
/// The directory and archive are deleted when the package is dropped or
/// [`closed`](ImagePackage::close), whichever happens first.
#[derive(Debug)]
pub struct ImagePackage {
    image: String,
    archive_path: PathBuf,
    size_bytes: u64,
    dir: TempDir,
}

impl ImagePackage {
    pub(crate) fn new(image: &str, dir: TempDir, archive_path: PathBuf, size_bytes: u64) -> Self {
        Self {
            image: image.to_string(),
            archive_path,
            size_bytes,
            dir,
        }
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    /// Archive file name, as sent in the multipart `image` part.
    pub fn file_name(&self) -> String {
        self.archive_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| archive_file_name(&self.image))
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the archive now, reporting any filesystem error.
    pub fn close(self) -> io::Result<()> {
        self.dir.close()
    }
}

/// `registry/org/name:tag` -> `registry_org_name_tag.tar`
pub fn archive_file_name(image: &str) -> String {
    let sanitized: String = image
        .trim()
        .chars()
        .map(|c| match c {
            '/' | ':' | '@' | '\\' => '_',
            other => other,
        })
        .collect();
    format!("{sanitized}.tar")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn archive_names_are_flat() {
        assert_eq!(archive_file_name("alpine"), "alpine.tar");
        assert_eq!(archive_file_name("library/alpine:3.19"), "library_alpine_3.19.tar");
        assert_eq!(
            archive_file_name("ghcr.io/acme/app@sha256:abc"),
            "ghcr.io_acme_app_sha256_abc.tar"
        );
    }

    #[test]
    fn drop_and_close_both_remove_the_directory() {
        let root = tempdir().unwrap();

        let make = || {
            let dir = tempfile::Builder::new()
                .prefix("image-")
                .tempdir_in(root.path())
                .unwrap();
            let archive = dir.path().join("alpine.tar");
            std::fs::write(&archive, b"tar bytes").unwrap();
            ImagePackage::new("alpine", dir, archive, 9)
        };

        let dropped = make();
        let dropped_dir = dropped.dir().to_path_buf();
        drop(dropped);
        assert!(!dropped_dir.exists());

        let closed = make();
        let closed_dir = closed.dir().to_path_buf();
        assert_eq!(closed.file_name(), "alpine.tar");
        closed.close().unwrap();
        assert!(!closed_dir.exists());

        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }
}
