//! Terminal status reporting.
//!
//! Every line the tool prints about a link action goes through the
//! [`Reporter`], so coloring and formatting stay out of the discovery and
//! state-machine logic. Colors degrade to plain text when the stream is not
//! a terminal.

use std::path::Path;

use owo_colors::{OwoColorize, Stream};

use crate::link::{LinkOutcome, Options};

pub mod symbols {
    pub const LINKED: &str = "✔";
    pub const UNLINKED: &str = "✘";
    pub const ARROW: &str = "→";
}

#[derive(Debug, Clone, Copy)]
pub struct Reporter {
    dry_run: bool,
    silent: bool,
}

impl Reporter {
    pub fn new(options: Options) -> Self {
        Self {
            dry_run: options.dry_run,
            silent: options.silent,
        }
    }

    /// One status line per terminal outcome. `Nothing` is suppressed on a
    /// silent run; `Failed` is reported through [`failure`](Self::failure)
    /// with the underlying error instead.
    pub fn status(&self, outcome: LinkOutcome, real_path: &Path, link_path: &Path) {
        let pair = pretty_pair(real_path, link_path);
        match outcome {
            LinkOutcome::Linked => {
                let marker = if self.dry_run {
                    dry_run_prefix()
                } else {
                    format!(
                        "{}",
                        symbols::LINKED.if_supports_color(Stream::Stdout, |s| s.green())
                    )
                };
                println!("{marker} Linked {pair}");
            }
            LinkOutcome::Unlinked => {
                let marker = if self.dry_run {
                    dry_run_prefix()
                } else {
                    format!(
                        "{}",
                        symbols::UNLINKED.if_supports_color(Stream::Stdout, |s| s.red())
                    )
                };
                println!("{marker} Unlinked {pair}");
            }
            LinkOutcome::Nothing => {
                if self.silent {
                    return;
                }
                if self.dry_run {
                    println!("  {} Nothing to do for {pair}", dry_run_prefix());
                } else {
                    println!("  Nothing to do for {pair}");
                }
            }
            LinkOutcome::Failed => {}
        }
    }

    /// Red error line on stderr. Used for per-action mutation failures and
    /// the run-level summary.
    pub fn failure(&self, message: &str) {
        eprintln!(
            "{}",
            message.if_supports_color(Stream::Stderr, |s| s.red())
        );
    }
}

fn pretty_pair(real_path: &Path, link_path: &Path) -> String {
    format!(
        "{} {} {}",
        real_path
            .display()
            .if_supports_color(Stream::Stdout, |s| s.yellow()),
        symbols::ARROW.if_supports_color(Stream::Stdout, |s| s.dimmed()),
        link_path
            .display()
            .if_supports_color(Stream::Stdout, |s| s.yellow()),
    )
}

fn dry_run_prefix() -> String {
    format!(
        "[{}]",
        "Dry run".if_supports_color(Stream::Stdout, |s| s.italic())
    )
}
