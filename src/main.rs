use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use stowed::commands::stow;
use stowed::link::Options;
use stowed::report::Reporter;
use stowed::runtime::RealRuntime;

const DIRECTORY_CONVENTION: &str = "\
Directory Convention:
  Packages should follow this structure:
    <package>/.config/<package>/   -> ~/.config/<package>
    <package>/.<dotfile>           -> ~/.<dotfile>";

/// stowed - create or remove symlinks for packages in a target directory.
///
/// Similar to GNU Stow, but simpler. Packages are resolved against the
/// current directory and mirrored into the target directory via symlinks.
///
/// Examples:
///   stowed nvim ghostty zsh      # Stow packages to the home directory
///   stowed -d nvim ghostty       # Preview changes without applying
///   stowed -t /custom/dir nvim   # Stow to a custom target directory
///   stowed --unlink nvim         # Remove symlinks
#[derive(Parser, Debug)]
#[command(author, version = env!("STOWED_VERSION"), about, after_help = DIRECTORY_CONVENTION)]
struct Cli {
    /// Packages to stow, resolved against the current directory
    #[arg(value_name = "PACKAGE", required = true)]
    packages: Vec<String>,

    /// Target directory for the operation (defaults to the home directory)
    #[arg(long, short = 't', env = "STOWED_TARGET", value_name = "DIR")]
    target: Option<PathBuf>,

    /// Perform a trial run with no changes made
    #[arg(long, short = 'd')]
    dry_run: bool,

    /// Suppress "nothing to do" messages
    #[arg(long)]
    silent: bool,

    /// Remove existing symlinks instead of creating them
    #[arg(long)]
    unlink: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = RealRuntime;

    let options = Options {
        dry_run: cli.dry_run,
        silent: cli.silent,
        unlink: cli.unlink,
    };
    let reporter = Reporter::new(options);

    match stow(runtime, &cli.packages, cli.target, options).await {
        Ok(summary) if summary.all_succeeded() => ExitCode::SUCCESS,
        Ok(_) => {
            reporter.failure("Some links failed to apply.");
            ExitCode::FAILURE
        }
        Err(err) => {
            reporter.failure(&format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_packages_parsing() {
        let cli = Cli::try_parse_from(["stowed", "nvim", "zsh"]).unwrap();
        assert_eq!(cli.packages, vec!["nvim", "zsh"]);
        assert_eq!(cli.target, None);
        assert!(!cli.dry_run);
        assert!(!cli.silent);
        assert!(!cli.unlink);
    }

    #[test]
    fn test_cli_target_parsing() {
        let cli = Cli::try_parse_from(["stowed", "-t", "/tmp", "nvim"]).unwrap();
        assert_eq!(cli.target, Some(PathBuf::from("/tmp")));
    }

    #[test]
    fn test_cli_flag_parsing() {
        let cli = Cli::try_parse_from(["stowed", "-d", "--silent", "--unlink", "nvim"]).unwrap();
        assert!(cli.dry_run);
        assert!(cli.silent);
        assert!(cli.unlink);
    }

    #[test]
    fn test_cli_no_packages_fails() {
        let result = Cli::try_parse_from(["stowed"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_no_packages_with_flags_fails() {
        let result = Cli::try_parse_from(["stowed", "--unlink"]);
        assert!(result.is_err());
    }
}
