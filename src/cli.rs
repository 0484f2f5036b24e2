//! Argument handling for the `pull` binary.
//!
//! Missing URL or XPath arguments are prompted for on stdin. Passing
//! `-i` (as a flag, or in place of the regex) also prompts for the regex and
//! its replacement.

use std::io::{self, BufRead, Write};
use std::time::Duration;

use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

use crate::error::Error;
use crate::options::{FetchOptions, Options, DEFAULT_USER_AGENT};

/// Fetch a web page, select text with XPath, and optionally rewrite it with a regex.
#[derive(Debug, Clone, Parser)]
#[command(name = "pull", version, about)]
pub struct Args {
    /// Page to fetch; `http://` is assumed when no scheme is given
    pub url: Option<String>,

    /// XPath expression selecting the nodes to print
    pub xpath: Option<String>,

    /// Regex applied to every line (case-insensitive, multi-line, replace all)
    #[arg(allow_hyphen_values = true)]
    pub regex: Option<String>,

    /// Replacement for regex matches; supports $1, ${name} and $&
    #[arg(allow_hyphen_values = true)]
    pub replacement: Option<String>,

    /// Prompt for every missing value, including regex and replacement
    #[arg(short, long)]
    pub interactive: bool,

    /// Request timeout in seconds; 0 disables the timeout
    #[arg(long, value_name = "SECONDS", default_value_t = 30)]
    pub timeout: u64,

    /// User-Agent header sent with the request
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Print the result as JSON instead of plain lines
    #[arg(long)]
    pub json: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Increase log verbosity (-v, -vv, -vvv); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Fully resolved inputs for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameters {
    pub url: String,
    pub options: Options,
}

impl Args {
    /// Fills in missing values, prompting on `output` and reading from `input`.
    pub fn resolve<R: BufRead, W: Write>(&self, input: &mut R, output: &mut W) -> io::Result<Parameters> {
        let mut interactive = self.interactive;

        let mut url = self.url.clone().unwrap_or_default();
        if url.trim().is_empty() {
            url = prompt("Url", input, output)?;
            interactive = true;
        }

        let mut xpath = self.xpath.clone().unwrap_or_default();
        if xpath.trim().is_empty() {
            xpath = prompt("XPath", input, output)?;
            interactive = true;
        }

        let mut regex = self.regex.clone().unwrap_or_default();
        if regex == "-i" {
            interactive = true;
            regex.clear();
        }
        if interactive && regex.trim().is_empty() {
            regex = prompt("Regex", input, output)?;
        }

        let mut replacement = self.replacement.clone().unwrap_or_default();
        if interactive && !regex.is_empty() && replacement.trim().is_empty() {
            replacement = prompt("Replacement", input, output)?;
        }

        let options = if regex.is_empty() {
            Options::new(xpath)
        } else {
            Options::new(xpath).with_rule(regex, replacement)
        };
        Ok(Parameters { url, options })
    }

    #[must_use]
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            user_agent: self.user_agent.clone(),
            timeout: (self.timeout > 0).then(|| Duration::from_secs(self.timeout)),
        }
    }
}

fn prompt<R: BufRead, W: Write>(label: &str, input: &mut R, output: &mut W) -> io::Result<String> {
    write!(output, "{label}: ")?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Process exit status for a failed run.
#[must_use]
pub fn exit_code(error: &Error) -> u8 {
    match error {
        Error::Fetch { .. } => 1,
        Error::MalformedQuery { .. } | Error::InvalidPattern { .. } => 2,
    }
}

/// Installs a stderr `tracing` subscriber. `RUST_LOG` wins over `verbose`.
pub fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("rs_pull={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
