use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Minimal stat result used to classify directory entries.
///
/// Both flags are false for nodes that are neither regular files nor
/// directories (sockets, device nodes, ...). Symlinks are followed, so a
/// link to a file reports as a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metadata {
    pub is_file: bool,
    pub is_dir: bool,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Runtime: Send + Sync {
    // File System
    async fn metadata(&self, path: &Path) -> Result<Metadata>;
    async fn exists(&self, path: &Path) -> bool;
    async fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;
    async fn create_dir_all(&self, path: &Path) -> Result<()>;
    async fn symlink(&self, original: &Path, link: &Path) -> Result<()>;
    async fn remove_symlink(&self, path: &Path) -> Result<()>;

    // Directories
    fn home_dir(&self) -> Option<PathBuf>;
    fn current_dir(&self) -> Result<PathBuf>;
}

pub struct RealRuntime;

#[async_trait]
impl Runtime for RealRuntime {
    #[tracing::instrument(skip(self))]
    async fn metadata(&self, path: &Path) -> Result<Metadata> {
        let meta = tokio::fs::metadata(path)
            .await
            .with_context(|| format!("Failed to stat {}", path.display()))?;
        Ok(Metadata {
            is_file: meta.is_file(),
            is_dir: meta.is_dir(),
        })
    }

    #[tracing::instrument(skip(self))]
    async fn exists(&self, path: &Path) -> bool {
        // A dangling symlink reports as absent, same as a stat failure.
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    #[tracing::instrument(skip(self))]
    async fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = tokio::fs::read_dir(path)
            .await
            .with_context(|| format!("Failed to read directory {}", path.display()))?;
        let mut children = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            children.push(entry.path());
        }
        Ok(children)
    }

    #[tracing::instrument(skip(self))]
    async fn create_dir_all(&self, path: &Path) -> Result<()> {
        tokio::fs::create_dir_all(path)
            .await
            .with_context(|| format!("Failed to create directory {}", path.display()))?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn symlink(&self, original: &Path, link: &Path) -> Result<()> {
        #[cfg(unix)]
        {
            tokio::fs::symlink(original, link)
                .await
                .context("Failed to create symlink")?;
        }
        #[cfg(windows)]
        {
            // If `original` is a relative path, checking it against the current
            // working directory would be wrong. It has to be resolved relative
            // to the directory where the symlink will be created.
            let target_path = if original.is_absolute() {
                original.to_path_buf()
            } else {
                link.parent()
                    .context("Failed to get parent directory for symlink")?
                    .join(original)
            };

            let is_dir = tokio::fs::metadata(&target_path)
                .await
                .map(|m| m.is_dir())
                .unwrap_or(false);

            if is_dir {
                tokio::fs::symlink_dir(original, link)
                    .await
                    .context("Failed to create directory symlink")?;
            } else {
                tokio::fs::symlink_file(original, link)
                    .await
                    .context("Failed to create file symlink")?;
            }
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn remove_symlink(&self, path: &Path) -> Result<()> {
        #[cfg(unix)]
        {
            tokio::fs::remove_file(path)
                .await
                .context("Failed to remove symlink")?;
        }
        #[cfg(windows)]
        {
            // On Windows a directory symlink has to be removed with remove_dir
            // and a file symlink with remove_file. Try the directory form
            // first, then fall back to the file form.
            if tokio::fs::remove_dir(path).await.is_err() {
                tokio::fs::remove_file(path)
                    .await
                    .context("Failed to remove symlink")?;
            }
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    fn home_dir(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }

    #[tracing::instrument(skip(self))]
    fn current_dir(&self) -> Result<PathBuf> {
        std::env::current_dir().context("Failed to determine current directory")
    }
}
