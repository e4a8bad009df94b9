//! goswagtags - Injects `@name` documentation annotations above exported Go
//! struct declarations.
//!
//! Swagger-style documentation generators read a `// @name <Identifier>`
//! comment above a struct to pick the canonical schema name for the type.
//! This crate parses Go source, finds every exported top-level struct
//! declaration that does not already carry the annotation, and splices the
//! comment in directly above the declaration, preserving every pre-existing
//! comment in its original order and position. Re-running the tool on its own
//! output changes nothing.
//!
//! # Architecture
//!
//! The modules form a per-file pipeline:
//!
//! 1. [`scanner`] - Walks directories and filters eligible `.go` files
//! 2. [`parser`] - Lexes and parses Go source into the [`ast`] model
//! 3. [`registry`] - Maps each declaration to its comment groups by position
//! 4. [`annotator`] - Decides eligibility and synthesizes `@name` comments
//! 5. [`serializer`] - Re-renders the file and normalizes whitespace
//!
//! Comments are positional in this model: a comment group belongs to the
//! file, keyed by byte offset, until the registry reconciles it with a
//! declaration. Inserting the synthesized comment is therefore a positional
//! merge (see [`registry::CommentRegistry::attach`]), replacing any group at
//! the same deterministic offset so repeated runs cannot duplicate it.
//!
//! # Example
//!
//! ```no_run
//! use goswagtags::rewrite_source;
//! use std::path::Path;
//!
//! let src = "package demo\n\ntype GetServiceRes struct {\n\tName string\n}\n";
//! let outcome = rewrite_source(Path::new("demo.go"), src, false).unwrap();
//! assert!(outcome.output.contains("// @name GetServiceRes"));
//! assert_eq!(outcome.annotated, 1);
//! ```
//!
//! For command-line usage see the [`cli`] module.

pub mod annotator;
pub mod ast;
pub mod cli;
pub mod error;
pub mod parser;
pub mod registry;
pub mod scanner;
pub mod serializer;

use std::path::Path;

use crate::parser::GoParser;
use crate::registry::CommentRegistry;

/// Result of rewriting one file's source text.
#[derive(Debug)]
pub struct RewriteOutcome {
    /// The annotated, whitespace-normalized source.
    pub output: String,
    /// Number of annotations added by this pass.
    pub annotated: usize,
}

/// Runs the whole pipeline over one file's source text. `path` is only used
/// for diagnostics; nothing is read from or written to disk.
pub fn rewrite_source(
    path: &Path,
    src: &str,
    nested: bool,
) -> Result<RewriteOutcome, error::ParseError> {
    let file = GoParser::parse_source(path, src)?;
    let mut registry = CommentRegistry::seed(&file);
    let annotated = annotator::annotate_file(&file, &mut registry, nested);
    let comments = registry.into_comments();
    Ok(RewriteOutcome {
        output: serializer::render(&file, &comments),
        annotated,
    })
}
