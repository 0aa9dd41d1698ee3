//! Directory enumeration for on-demand rule runs.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::marker::is_marker_stream;

/// Breadth-first listing of the files under `root`.
///
/// Descends into subdirectories only when `recursive`. Unreadable
/// directories are logged and skipped; marker streams (visible as plain
/// siblings on non-NTFS filesystems) are filtered out.
pub(crate) async fn collect_files(root: &Path, recursive: bool) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut queue = VecDeque::from([root.to_path_buf()]);

    while let Some(dir) = queue.pop_front() {
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) => {
                warn!("failed to read {}: {}", dir.display(), err);
                continue;
            }
        };

        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => {
                    let path = entry.path();
                    match entry.file_type().await {
                        Ok(kind) if kind.is_dir() => {
                            if recursive {
                                queue.push_back(path);
                            }
                        }
                        Ok(kind) if kind.is_file() => {
                            if !is_marker_stream(&path) {
                                files.push(path);
                            }
                        }
                        Ok(_) => {}
                        Err(err) => {
                            warn!(
                                "failed to stat {}: {}",
                                path.display(),
                                err
                            );
                        }
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    warn!("failed to enumerate {}: {}", dir.display(), err);
                    break;
                }
            }
        }
    }

    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lists_only_top_level_when_not_recursive() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.bin"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("b.bin"), b"x").unwrap();

        let files = collect_files(dir.path(), false).await;
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("a.bin"));

        let files = collect_files(dir.path(), true).await;
        assert_eq!(files.len(), 2);
    }

    #[tokio::test]
    async fn filters_marker_streams() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.bin"), b"x").unwrap();
        std::fs::write(dir.path().join("a.bin:Zone.Identifier"), b"x")
            .unwrap();

        let files = collect_files(dir.path(), false).await;
        assert_eq!(files.len(), 1);
    }

    #[tokio::test]
    async fn missing_root_yields_nothing() {
        let files =
            collect_files(Path::new("/definitely/not/here"), true).await;
        assert!(files.is_empty());
    }
}
