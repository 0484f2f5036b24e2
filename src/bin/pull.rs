//! `pull URL XPATH [REGEX] [REPLACEMENT]`
//!
//! Fetches a page, prints the text of every node matching XPATH, optionally
//! rewritten with REGEX/REPLACEMENT, followed by the number of occurrences.

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use rs_pull::cli::{self, Args};
use rs_pull::present::Presenter;
use rs_pull::{pull_url, HttpFetcher};

fn main() -> ExitCode {
    let args = Args::parse();
    cli::init_logging(args.verbose);
    let presenter = Presenter::new(!args.no_color);

    let params = {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut stdout = io::stdout();
        match args.resolve(&mut input, &mut stdout) {
            Ok(params) => params,
            Err(err) => {
                eprintln!("Failed to read input: {err}");
                return ExitCode::FAILURE;
            }
        }
    };

    let result = HttpFetcher::new(&args.fetch_options())
        .and_then(|fetcher| pull_url(&fetcher, &params.url, &params.options));

    let mut stdout = io::stdout().lock();
    let written = match result {
        Ok(extraction) if args.json => presenter.render_json(&mut stdout, &extraction),
        Ok(extraction) => presenter.render(&mut stdout, &extraction),
        Err(err) => {
            tracing::debug!(error = ?err, "run failed");
            let _ = presenter.render_error(&mut io::stderr(), &err);
            return ExitCode::from(cli::exit_code(&err));
        }
    };

    if let Err(err) = written.and_then(|()| stdout.flush()) {
        // Closed pipe (e.g. `| head`) is not worth reporting.
        if err.kind() != io::ErrorKind::BrokenPipe {
            eprintln!("Failed to write output: {err}");
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}
