//! Package discovery.
//!
//! A package is a directory under the root whose layout mirrors what the
//! target directory should end up with. Discovery walks the package tree
//! and decides per node how it reaches the target:
//!
//! 1. files are always linked individually;
//! 2. a directory named like the package is claimed as a whole subtree
//!    (`<package>/.config/<package>` becomes `<target>/.config/<package>`);
//! 3. a directory holding at least one direct file child is a leaf and is
//!    linked as one unit;
//! 4. a directory holding only subdirectories is a container and is
//!    traversed further, never linked itself.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use anyhow::{Result, bail};
use log::debug;

use crate::link::{LinkAction, Options};
use crate::runtime::Runtime;

/// Classification of a directory entry during discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DirClass {
    /// Named after the package; claimed as a whole subtree.
    Owned,
    /// Has at least one direct file child; linked as one unit.
    Leaf,
    /// Only subdirectories below; traversed, never linked itself.
    Container,
}

/// A named package directory under the root.
#[derive(Debug, Clone)]
pub struct Package {
    pub name: String,
    pub path: PathBuf,
}

impl Package {
    /// Build a package from a user-supplied input string. The input is
    /// normalized (leading `./` and trailing `/` stripped) and its first
    /// path segment becomes the package name.
    pub fn new(input: &str, root_dir: &Path) -> Result<Self> {
        let normalized = input.strip_prefix("./").unwrap_or(input);
        let normalized = normalized.strip_suffix('/').unwrap_or(normalized);

        let name = normalized.split('/').next().unwrap_or("");
        if name.is_empty() {
            bail!("Invalid package path: {input}");
        }

        Ok(Self {
            name: name.to_string(),
            path: root_dir.join(name),
        })
    }

    /// Discover the link actions that deploy this package into `target_dir`.
    ///
    /// Any listing or stat error below the package root fails the whole
    /// resolution; no partial action list is returned.
    #[tracing::instrument(skip(runtime, options))]
    pub async fn discover_links<R: Runtime>(
        &self,
        runtime: &R,
        target_dir: &Path,
        options: Options,
    ) -> Result<Vec<LinkAction>> {
        let links = self
            .discover(runtime, self.path.clone(), target_dir, PathBuf::new(), options)
            .await?;
        debug!("Package {} resolved to {} links", self.name, links.len());
        Ok(links)
    }

    // The walk awaits itself for container directories, hence the boxed
    // future instead of an async fn.
    fn discover<'a, R: Runtime>(
        &'a self,
        runtime: &'a R,
        current: PathBuf,
        target_dir: &'a Path,
        relative: PathBuf,
        options: Options,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<LinkAction>>> + Send + 'a>> {
        Box::pin(async move {
            let mut links = Vec::new();

            for child_path in runtime.read_dir(&current).await? {
                let Some(name) = child_path.file_name() else {
                    continue;
                };
                let child_rel = relative.join(name);
                let meta = runtime.metadata(&child_path).await?;

                if meta.is_file {
                    links.push(LinkAction::new(
                        child_path,
                        target_dir.join(&child_rel),
                        options,
                    ));
                } else if meta.is_dir {
                    // The name check comes first so an owned directory's
                    // children are never listed.
                    let class = if name == self.name.as_str() {
                        DirClass::Owned
                    } else if contains_files(runtime, &child_path).await? {
                        DirClass::Leaf
                    } else {
                        DirClass::Container
                    };

                    match class {
                        DirClass::Owned | DirClass::Leaf => {
                            links.push(LinkAction::new(
                                child_path,
                                target_dir.join(&child_rel),
                                options,
                            ));
                        }
                        DirClass::Container => {
                            let sub = self
                                .discover(runtime, child_path, target_dir, child_rel, options)
                                .await?;
                            links.extend(sub);
                        }
                    }
                }
                // Nodes that are neither files nor directories are skipped.
            }

            Ok(links)
        })
    }
}

/// Whether a directory has at least one direct file child. Only immediate
/// children count; files further down leave it a container.
async fn contains_files<R: Runtime>(runtime: &R, dir: &Path) -> Result<bool> {
    for child in runtime.read_dir(dir).await? {
        if runtime.metadata(&child).await?.is_file {
            return Ok(true);
        }
    }
    Ok(false)
}
