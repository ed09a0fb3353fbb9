use clap::Parser;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "+", env!("BUILD_NUMBER"));

#[derive(Parser, Debug)]
#[command(name = "azw", version = VERSION, about = "Azure Pipelines Watcher TUI")]
pub struct Cli {
    /// Run (build) id to watch; defaults to the newest run
    pub run_id: Option<u64>,

    /// Azure DevOps organization URL (falls back to `az devops configure` defaults)
    #[arg(short, long)]
    pub org: Option<String>,

    /// Project name (falls back to `az devops configure` defaults)
    #[arg(short, long)]
    pub project: Option<String>,

    /// Pipeline definition id used to pick the newest run
    #[arg(long)]
    pub pipeline: Option<u64>,

    /// Refresh interval in seconds
    #[arg(short, long, default_value_t = 2, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: u64,

    /// Maximum number of log lines kept per record
    #[arg(long, default_value_t = 100_000, value_parser = validate_log_lines)]
    pub log_lines: usize,

    /// Disable desktop notifications
    #[arg(long)]
    pub no_notify: bool,

    /// Enable verbose logging to $XDG_STATE_HOME/azw/debug.log
    #[arg(short, long)]
    pub verbose: bool,
}

pub fn validate_log_lines(s: &str) -> Result<usize, String> {
    let n: usize = s.parse().map_err(|e| format!("invalid number: {e}"))?;
    if n == 0 {
        return Err("must be at least 1".to_string());
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["azw"]).unwrap();
        assert_eq!(cli.run_id, None);
        assert_eq!(cli.interval, 2);
        assert_eq!(cli.log_lines, 100_000);
        assert!(!cli.no_notify);
        assert!(!cli.verbose);
    }

    #[test]
    fn positional_run_id_and_flags() {
        let cli = Cli::try_parse_from([
            "azw", "1234", "--org", "https://dev.azure.com/acme", "-p", "Web", "-i", "5",
        ])
        .unwrap();
        assert_eq!(cli.run_id, Some(1234));
        assert_eq!(cli.org.as_deref(), Some("https://dev.azure.com/acme"));
        assert_eq!(cli.project.as_deref(), Some("Web"));
        assert_eq!(cli.interval, 5);
    }

    #[test]
    fn zero_interval_rejected() {
        assert!(Cli::try_parse_from(["azw", "--interval", "0"]).is_err());
    }

    #[test]
    fn log_lines_validation() {
        assert_eq!(validate_log_lines("10"), Ok(10));
        assert!(validate_log_lines("0").is_err());
        assert!(validate_log_lines("abc").is_err());
    }
}
