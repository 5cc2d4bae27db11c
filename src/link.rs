//! The link action state machine.
//!
//! A [`LinkAction`] is one source-to-destination symlink operation. Applying
//! it either creates or removes the link depending on the run's mode, is
//! idempotent against the current filesystem state, and records exactly one
//! terminal [`LinkOutcome`] per apply.

use std::path::PathBuf;

use log::debug;

use crate::report::Reporter;
use crate::runtime::Runtime;

/// Whether a run creates or removes symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkMode {
    Link,
    Unlink,
}

/// Terminal outcome of applying a [`LinkAction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// The symlink was created (or would be, on a dry run).
    Linked,
    /// The symlink was removed (or would be, on a dry run).
    Unlinked,
    /// The filesystem already had the desired state; nothing was done.
    Nothing,
    /// A filesystem mutation failed; the action is terminal but siblings
    /// still run.
    Failed,
}

impl LinkOutcome {
    pub fn is_failed(self) -> bool {
        matches!(self, LinkOutcome::Failed)
    }
}

/// Options shared by every link action in a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    /// Compute outcomes without touching the filesystem.
    pub dry_run: bool,
    /// Suppress "nothing to do" status lines.
    pub silent: bool,
    /// Remove symlinks instead of creating them.
    pub unlink: bool,
}

/// One symlink operation between a source path and a destination path.
#[derive(Debug)]
pub struct LinkAction {
    /// Source-side path the link points to.
    pub real_path: PathBuf,
    /// Destination-side path where the link is created or removed.
    pub link_path: PathBuf,
    mode: LinkMode,
    options: Options,
    outcome: Option<LinkOutcome>,
}

impl LinkAction {
    /// Build an action from a raw path pair; the mode is fixed here from
    /// the run's options.
    pub fn new(real_path: PathBuf, link_path: PathBuf, options: Options) -> Self {
        let mode = if options.unlink {
            LinkMode::Unlink
        } else {
            LinkMode::Link
        };
        Self {
            real_path,
            link_path,
            mode,
            options,
            outcome: None,
        }
    }

    pub fn mode(&self) -> LinkMode {
        self.mode
    }

    /// The recorded outcome; `None` until [`apply`](Self::apply) has run.
    pub fn outcome(&self) -> Option<LinkOutcome> {
        self.outcome
    }

    /// Run the action. Only the existence of `link_path` is checked, never
    /// where an existing link points, so repeated runs settle into
    /// [`LinkOutcome::Nothing`]. Failures are reported and recorded, never
    /// propagated.
    pub async fn apply<R: Runtime>(&mut self, runtime: &R, reporter: &Reporter) -> LinkOutcome {
        debug!(
            "Applying {:?} {} -> {}",
            self.mode,
            self.real_path.display(),
            self.link_path.display()
        );
        let outcome = match self.mode {
            LinkMode::Link => self.link(runtime, reporter).await,
            LinkMode::Unlink => self.unlink(runtime, reporter).await,
        };
        self.outcome = Some(outcome);
        if !outcome.is_failed() {
            reporter.status(outcome, &self.real_path, &self.link_path);
        }
        outcome
    }

    async fn link<R: Runtime>(&self, runtime: &R, reporter: &Reporter) -> LinkOutcome {
        if runtime.exists(&self.link_path).await {
            return LinkOutcome::Nothing;
        }

        if !self.options.dry_run {
            if let Some(parent) = self.link_path.parent() {
                if let Err(err) = runtime.create_dir_all(parent).await {
                    reporter.failure(&format!(
                        "Failed to create directory for {}: {err:#}",
                        self.link_path.display()
                    ));
                    return LinkOutcome::Failed;
                }
            }

            if let Err(err) = runtime.symlink(&self.real_path, &self.link_path).await {
                reporter.failure(&format!(
                    "Failed to create symlink from {} to {}: {err:#}",
                    self.real_path.display(),
                    self.link_path.display()
                ));
                return LinkOutcome::Failed;
            }
        }

        LinkOutcome::Linked
    }

    async fn unlink<R: Runtime>(&self, runtime: &R, reporter: &Reporter) -> LinkOutcome {
        if !runtime.exists(&self.link_path).await {
            return LinkOutcome::Nothing;
        }

        if !self.options.dry_run {
            if let Err(err) = runtime.remove_symlink(&self.link_path).await {
                reporter.failure(&format!(
                    "Failed to unlink {}: {err:#}",
                    self.link_path.display()
                ));
                return LinkOutcome::Failed;
            }
        }

        LinkOutcome::Unlinked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use anyhow::anyhow;
    use mockall::predicate::eq;
    use std::path::PathBuf;

    fn reporter() -> Reporter {
        Reporter::new(Options::default())
    }

    #[tokio::test]
    async fn test_link_creates_symlink_when_target_missing() {
        let mut runtime = MockRuntime::new();

        let real = PathBuf::from("/source/file");
        let link = PathBuf::from("/target/file");

        runtime
            .expect_exists()
            .with(eq(link.clone()))
            .times(1)
            .returning(|_| false);
        runtime
            .expect_create_dir_all()
            .with(eq(PathBuf::from("/target")))
            .times(1)
            .returning(|_| Ok(()));
        runtime
            .expect_symlink()
            .with(eq(real.clone()), eq(link.clone()))
            .times(1)
            .returning(|_, _| Ok(()));

        let mut action = LinkAction::new(real, link, Options::default());
        let outcome = action.apply(&runtime, &reporter()).await;

        assert_eq!(outcome, LinkOutcome::Linked);
        assert_eq!(action.outcome(), Some(LinkOutcome::Linked));
    }

    #[tokio::test]
    async fn test_link_creates_parent_directories() {
        let mut runtime = MockRuntime::new();

        let real = PathBuf::from("/source/file");
        let link = PathBuf::from("/target/deep/nested/file");

        runtime.expect_exists().returning(|_| false);
        runtime
            .expect_create_dir_all()
            .with(eq(PathBuf::from("/target/deep/nested")))
            .times(1)
            .returning(|_| Ok(()));
        runtime.expect_symlink().returning(|_, _| Ok(()));

        let mut action = LinkAction::new(real, link, Options::default());
        assert_eq!(action.apply(&runtime, &reporter()).await, LinkOutcome::Linked);
    }

    #[tokio::test]
    async fn test_link_nothing_when_target_exists() {
        // No create_dir_all/symlink expectations: the mock panics if the
        // action tries to mutate anything.
        let mut runtime = MockRuntime::new();
        runtime.expect_exists().returning(|_| true);

        let mut action = LinkAction::new(
            PathBuf::from("/source/file"),
            PathBuf::from("/target/file"),
            Options::default(),
        );
        let outcome = action.apply(&runtime, &reporter()).await;

        assert_eq!(outcome, LinkOutcome::Nothing);
        assert_eq!(action.outcome(), Some(LinkOutcome::Nothing));
    }

    #[tokio::test]
    async fn test_link_dry_run_is_pure() {
        let mut runtime = MockRuntime::new();
        runtime.expect_exists().returning(|_| false);

        let options = Options {
            dry_run: true,
            ..Options::default()
        };
        let mut action = LinkAction::new(
            PathBuf::from("/source/file"),
            PathBuf::from("/target/file"),
            options,
        );

        // Same outcome as the real success case, no mutating calls.
        assert_eq!(action.apply(&runtime, &reporter()).await, LinkOutcome::Linked);
    }

    #[tokio::test]
    async fn test_link_failed_when_create_dir_fails() {
        let mut runtime = MockRuntime::new();

        runtime.expect_exists().returning(|_| false);
        runtime
            .expect_create_dir_all()
            .returning(|_| Err(anyhow!("Permission denied")));
        // The symlink step must not be attempted after a mkdir failure.

        let mut action = LinkAction::new(
            PathBuf::from("/source/file"),
            PathBuf::from("/target/file"),
            Options::default(),
        );
        let outcome = action.apply(&runtime, &reporter()).await;

        assert_eq!(outcome, LinkOutcome::Failed);
        assert_eq!(action.outcome(), Some(LinkOutcome::Failed));
    }

    #[tokio::test]
    async fn test_link_failed_when_symlink_fails() {
        let mut runtime = MockRuntime::new();

        runtime.expect_exists().returning(|_| false);
        runtime.expect_create_dir_all().returning(|_| Ok(()));
        runtime
            .expect_symlink()
            .returning(|_, _| Err(anyhow!("File exists")));

        let mut action = LinkAction::new(
            PathBuf::from("/source/file"),
            PathBuf::from("/target/file"),
            Options::default(),
        );
        assert_eq!(action.apply(&runtime, &reporter()).await, LinkOutcome::Failed);
    }

    #[tokio::test]
    async fn test_link_idempotent_across_runs() {
        // First apply links, second apply finds the link and does nothing.
        let mut runtime = MockRuntime::new();
        let mut seq = mockall::Sequence::new();

        runtime
            .expect_exists()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| false);
        runtime
            .expect_create_dir_all()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        runtime
            .expect_symlink()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        runtime
            .expect_exists()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| true);

        let real = PathBuf::from("/source/file");
        let link = PathBuf::from("/target/file");

        let mut first = LinkAction::new(real.clone(), link.clone(), Options::default());
        assert_eq!(first.apply(&runtime, &reporter()).await, LinkOutcome::Linked);

        let mut second = LinkAction::new(real, link, Options::default());
        assert_eq!(second.apply(&runtime, &reporter()).await, LinkOutcome::Nothing);
    }

    #[tokio::test]
    async fn test_unlink_removes_existing_link() {
        let mut runtime = MockRuntime::new();

        let link = PathBuf::from("/target/file");
        runtime
            .expect_exists()
            .with(eq(link.clone()))
            .returning(|_| true);
        runtime
            .expect_remove_symlink()
            .with(eq(link.clone()))
            .times(1)
            .returning(|_| Ok(()));

        let options = Options {
            unlink: true,
            ..Options::default()
        };
        let mut action = LinkAction::new(PathBuf::from("/source/file"), link, options);

        assert_eq!(action.mode(), LinkMode::Unlink);
        assert_eq!(action.apply(&runtime, &reporter()).await, LinkOutcome::Unlinked);
    }

    #[tokio::test]
    async fn test_unlink_nothing_when_target_missing() {
        let mut runtime = MockRuntime::new();
        runtime.expect_exists().returning(|_| false);

        let options = Options {
            unlink: true,
            ..Options::default()
        };
        let mut action = LinkAction::new(
            PathBuf::from("/source/file"),
            PathBuf::from("/target/file"),
            options,
        );
        assert_eq!(action.apply(&runtime, &reporter()).await, LinkOutcome::Nothing);
    }

    #[tokio::test]
    async fn test_unlink_dry_run_is_pure() {
        let mut runtime = MockRuntime::new();
        runtime.expect_exists().returning(|_| true);

        let options = Options {
            unlink: true,
            dry_run: true,
            ..Options::default()
        };
        let mut action = LinkAction::new(
            PathBuf::from("/source/file"),
            PathBuf::from("/target/file"),
            options,
        );
        assert_eq!(action.apply(&runtime, &reporter()).await, LinkOutcome::Unlinked);
    }

    #[tokio::test]
    async fn test_unlink_failed_when_remove_fails() {
        let mut runtime = MockRuntime::new();

        runtime.expect_exists().returning(|_| true);
        runtime
            .expect_remove_symlink()
            .returning(|_| Err(anyhow!("Permission denied")));

        let options = Options {
            unlink: true,
            ..Options::default()
        };
        let mut action = LinkAction::new(
            PathBuf::from("/source/file"),
            PathBuf::from("/target/file"),
            options,
        );
        assert_eq!(action.apply(&runtime, &reporter()).await, LinkOutcome::Failed);
    }

    #[tokio::test]
    async fn test_unlink_idempotent_across_runs() {
        let mut runtime = MockRuntime::new();
        let mut seq = mockall::Sequence::new();

        runtime
            .expect_exists()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| true);
        runtime
            .expect_remove_symlink()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        runtime
            .expect_exists()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| false);

        let options = Options {
            unlink: true,
            ..Options::default()
        };
        let real = PathBuf::from("/source/file");
        let link = PathBuf::from("/target/file");

        let mut first = LinkAction::new(real.clone(), link.clone(), options);
        assert_eq!(first.apply(&runtime, &reporter()).await, LinkOutcome::Unlinked);

        let mut second = LinkAction::new(real, link, options);
        assert_eq!(second.apply(&runtime, &reporter()).await, LinkOutcome::Nothing);
    }
}
