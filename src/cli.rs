//! Command-line surface and the per-file annotation workflow.

use anyhow::Result;
use clap::{CommandFactory, Parser};
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::annotator;
use crate::parser::GoParser;
use crate::registry::CommentRegistry;
use crate::scanner::{self, FileScanner};
use crate::serializer;

/// goswagtags - Injects swagger-style @name annotations above exported Go structs
#[derive(Parser, Debug)]
#[command(name = "goswagtags")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Files or directories to process (directories are walked recursively)
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Rewrite each processed file in place instead of printing to stdout
    #[arg(short = 'i', long = "in-place")]
    pub in_place: bool,

    /// Annotate structs declared inside function bodies, qualifying the name
    /// with the enclosing function (GetAppList + Res -> GetAppListRes)
    #[arg(short = 'n', long = "nested")]
    pub nested: bool,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Runs the whole workflow for the parsed arguments.
///
/// Stat failures on an argument are reported and processing continues with
/// the remaining paths; parse, walk and write failures abort the run.
pub fn run(args: CliArgs) -> Result<()> {
    if args.paths.is_empty() {
        // Usage goes to the error stream; nothing else is printed.
        eprint!("{}", CliArgs::command().render_help());
        return Ok(());
    }

    let mut processed = 0usize;
    let mut annotated = 0usize;

    for path in &args.paths {
        match fs::metadata(path) {
            Err(err) => {
                warn!("{}: {}", path.display(), err);
                continue;
            }
            Ok(meta) if meta.is_dir() => {
                let files = FileScanner::new(path.clone()).scan()?;
                debug!("found {} Go files under {}", files.len(), path.display());
                for file in &files {
                    annotated += process_file(file, &args)?;
                    processed += 1;
                }
            }
            Ok(_) => {
                // An explicitly-named file is judged by its name alone; the
                // component filters only apply while walking a directory.
                let eligible = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(scanner::is_eligible_name);
                if eligible {
                    annotated += process_file(path, &args)?;
                    processed += 1;
                } else {
                    debug!("skipping ineligible path {}", path.display());
                }
            }
        }
    }

    info!("processed {processed} files, added {annotated} annotations");
    Ok(())
}

/// Parses, annotates and re-renders one file, then writes it back or prints
/// it depending on the mode flag. Returns the number of annotations added.
fn process_file(path: &Path, args: &CliArgs) -> Result<usize> {
    let file = GoParser::parse_file(path)?;

    let mut registry = CommentRegistry::seed(&file);
    let count = annotator::annotate_file(&file, &mut registry, args.nested);
    let comments = registry.into_comments();
    let output = serializer::render(&file, &comments);

    if args.in_place {
        serializer::write_in_place(&output, path)?;
        debug!("rewrote {} ({} annotations)", path.display(), count);
    } else {
        print!("{output}");
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn args(paths: Vec<PathBuf>, in_place: bool) -> CliArgs {
        CliArgs {
            paths,
            in_place,
            nested: false,
            verbose: false,
        }
    }

    #[test]
    fn test_run_rewrites_directory_in_place() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(
            root.join("types.go"),
            "package demo\n\ntype GetServiceRes struct {\n\tName string\n}\n",
        )
        .unwrap();

        run(args(vec![root.to_path_buf()], true)).unwrap();

        let content = fs::read_to_string(root.join("types.go")).unwrap();
        assert!(content.contains("// @name GetServiceRes\ntype GetServiceRes struct {"));
    }

    #[test]
    fn test_run_accepts_explicit_file_under_hidden_directory() {
        let temp_dir = TempDir::new().unwrap();
        let hidden = temp_dir.path().join(".config/proj");
        fs::create_dir_all(&hidden).unwrap();
        let file = hidden.join("types.go");
        fs::write(&file, "package demo\n\ntype GetServiceRes struct {\n}\n").unwrap();

        run(args(vec![file.clone()], true)).unwrap();

        let content = fs::read_to_string(&file).unwrap();
        assert!(content.contains("// @name GetServiceRes"));
    }

    #[test]
    fn test_run_continues_past_missing_path() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("types.go"), "package demo\n\ntype Res struct {\n}\n").unwrap();

        let missing = root.join("does-not-exist");
        run(args(vec![missing, root.to_path_buf()], true)).unwrap();

        let content = fs::read_to_string(root.join("types.go")).unwrap();
        assert!(content.contains("// @name Res"));
    }

    #[test]
    fn test_run_fails_on_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("broken.go"), "package demo\n\ntype Broken struct {\n").unwrap();

        let result = run(args(vec![root.to_path_buf()], true));
        assert!(result.is_err());
    }

    #[test]
    fn test_run_with_no_paths_is_ok() {
        run(args(Vec::new(), false)).unwrap();
    }
}
