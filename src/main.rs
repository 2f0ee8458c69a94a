//! rotab CLI entry point.

use rotab::cli::{self, Cli};
use rotab::core::error::render_error_block;

#[tokio::main]
async fn main() {
    // Parse command-line arguments; bad flags are exit code 1, while
    // --help/--version remain a clean exit.
    let cli = match Cli::parse_args() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        },
    };

    if let Err(err) = cli::execute(cli).await {
        eprintln!(
            "{}",
            render_error_block("running backups", &err.to_string(), err.category(), chrono::Utc::now())
        );
        std::process::exit(err.exit_code());
    }
}
