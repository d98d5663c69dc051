//! Print the GraphQL SDL, e.g. for the Relay compiler.
//!
//! Usage: `graphql-schema [--out <path>]` (stdout when no path is given).

use std::io::Write;
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let out = match (args.next().as_deref(), args.next()) {
        (None, _) => None,
        (Some("--out"), Some(path)) => Some(path),
        _ => {
            eprintln!("usage: graphql-schema [--out <path>]");
            return ExitCode::from(2);
        }
    };

    let sdl = graphql_schema::sdl();
    let written = match &out {
        Some(path) => std::fs::write(path, &sdl),
        None => std::io::stdout().write_all(sdl.as_bytes()),
    };
    match written {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("failed to write schema: {e}");
            ExitCode::FAILURE
        }
    }
}
