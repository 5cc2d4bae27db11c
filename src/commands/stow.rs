//! The stow run: validate, resolve, apply, aggregate.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use log::debug;

use crate::link::{LinkAction, Options};
use crate::package::Package;
use crate::report::Reporter;
use crate::runtime::Runtime;

/// Per-action results of a completed run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub succeeded: Vec<LinkAction>,
    pub failed: Vec<LinkAction>,
}

impl RunSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Deploy (or withdraw) the named packages into the target directory.
///
/// Packages are resolved against the current directory. Every requested
/// package is validated before any resolution or mutation happens, so a
/// missing package aborts the whole run. Once application starts, a failed
/// action is recorded and the remaining actions still run.
#[tracing::instrument(skip(runtime, options))]
pub async fn stow<R: Runtime>(
    runtime: R,
    inputs: &[String],
    target_dir: Option<PathBuf>,
    options: Options,
) -> Result<RunSummary> {
    let root_dir = runtime.current_dir()?;
    let target_dir = match target_dir {
        Some(dir) => dir,
        None => runtime
            .home_dir()
            .context("Failed to determine home directory")?,
    };
    debug!(
        "Stowing from {} into {}",
        root_dir.display(),
        target_dir.display()
    );

    // Pre-flight: all-or-nothing validation of the requested packages.
    let mut packages = Vec::new();
    for input in inputs {
        let package = Package::new(input, &root_dir)?;
        if !runtime.exists(&package.path).await {
            bail!("Package does not exist: {}", package.name);
        }
        packages.push(package);
    }

    let mut links = Vec::new();
    for package in &packages {
        links.extend(
            package
                .discover_links(&runtime, &target_dir, options)
                .await?,
        );
    }

    let reporter = Reporter::new(options);
    let mut summary = RunSummary::default();
    for mut link in links {
        let outcome = link.apply(&runtime, &reporter).await;
        if outcome.is_failed() {
            summary.failed.push(link);
        } else {
            summary.succeeded.push(link);
        }
    }

    Ok(summary)
}
