//! goswagtags - Injects `@name` documentation annotations above exported Go
//! structs so swagger/OpenAPI generators can discover a canonical name for
//! each type.
//!
//! # Usage
//!
//! ```bash
//! goswagtags [-i] [-n] <path> ...
//! ```
//!
//! # Examples
//!
//! Print the annotated version of every Go file under a directory:
//! ```bash
//! goswagtags ./internal/api
//! ```
//!
//! Rewrite files in place:
//! ```bash
//! goswagtags -i ./internal/api
//! ```
//!
//! Annotate function-local structs with compound names:
//! ```bash
//! goswagtags -i -n handlers.go
//! ```

use clap::Parser;

use goswagtags::cli::{self, CliArgs};

fn main() {
    let args = CliArgs::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Err(err) = cli::run(args) {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}
