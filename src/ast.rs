//! Data model for parsed Go source files.
//!
//! Comments in this model belong to the file, not to tree nodes: every comment
//! group carries the byte offset of its first `/` and the file keeps a flat,
//! position-ordered list of groups next to the declaration list. Declarations
//! only record byte spans; the [`crate::registry`] module reconciles the two
//! sides before rendering.

use std::path::PathBuf;

/// Byte offset into a file's source text.
pub type Pos = usize;

/// Byte range covering one syntactic element. `end` is exclusive for slicing
/// purposes but [`Span::contains`] treats it as inclusive, because synthesized
/// comment positions sit exactly at the end of the spec they belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: Pos,
    pub end: Pos,
}

impl Span {
    pub fn new(start: Pos, end: Pos) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, pos: Pos) -> bool {
        self.start <= pos && pos <= self.end
    }
}

/// A single `//` or `/* */` comment. `text` holds the literal comment
/// including its markers; `slash` is the byte offset of the opening `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub slash: Pos,
    pub text: String,
}

impl Comment {
    pub fn end(&self) -> Pos {
        self.slash + self.text.len()
    }
}

/// One or more textually adjacent comments treated as a unit.
///
/// Groups produced by the parser carry `synthetic: false`; groups produced by
/// the annotator carry `synthetic: true` and always hold exactly one comment
/// positioned at the end of the type specifier they annotate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentGroup {
    pub list: Vec<Comment>,
    pub synthetic: bool,
}

impl CommentGroup {
    /// Starting position of the group (offset of the first slash).
    pub fn pos(&self) -> Pos {
        self.list.first().map_or(0, |c| c.slash)
    }

    /// End position of the group (one past the last comment's final byte).
    pub fn end(&self) -> Pos {
        self.list.last().map_or(0, |c| c.end())
    }

    /// The comment content with markers stripped, lines joined by `\n` and
    /// each line trimmed. `// @name Foo` becomes `@name Foo`.
    pub fn text(&self) -> String {
        let mut lines = Vec::new();
        for comment in &self.list {
            if let Some(rest) = comment.text.strip_prefix("//") {
                lines.push(rest.trim().to_string());
            } else {
                let inner = comment
                    .text
                    .trim_start_matches("/*")
                    .trim_end_matches("*/");
                for line in inner.lines() {
                    lines.push(line.trim().to_string());
                }
            }
        }
        lines.join("\n")
    }

    /// Builds the single-comment group the annotator attaches to a struct
    /// declaration. `pos` is the end of the type specifier; `text` is the
    /// annotation content without comment markers.
    pub fn synthesized(pos: Pos, text: &str) -> Self {
        Self {
            list: vec![Comment {
                slash: pos,
                text: format!("// {text}"),
            }],
            synthetic: true,
        }
    }
}

/// A parsed Go source file.
#[derive(Debug, Clone)]
pub struct GoFile {
    /// Path the file was read from (used for diagnostics).
    pub path: PathBuf,
    /// The original source text. Rendering reproduces all non-comment bytes
    /// from this string.
    pub src: String,
    /// Name from the `package` clause.
    pub package_name: String,
    /// Top-level declarations in document order.
    pub decls: Vec<Decl>,
    /// All comment groups in the file, in increasing position order.
    pub comments: Vec<CommentGroup>,
}

impl GoFile {
    /// Start offset of the innermost declaration whose span contains `pos`.
    ///
    /// Used by the renderer to find the line a synthesized comment must be
    /// emitted above: struct declarations nested in a function body are more
    /// specific than the function itself.
    pub fn anchor_for(&self, pos: Pos) -> Option<Pos> {
        let mut anchor = None;
        for decl in &self.decls {
            if !decl.span.contains(pos) {
                continue;
            }
            anchor = Some(decl.span.start);
            if let DeclKind::Func(func) = &decl.kind {
                for local in &func.local_types {
                    if local.span.contains(pos) {
                        anchor = Some(local.span.start);
                    }
                }
            }
        }
        anchor
    }
}

/// A top-level declaration.
#[derive(Debug, Clone)]
pub struct Decl {
    pub span: Span,
    pub kind: DeclKind,
}

/// The closed set of declaration kinds the annotator inspects. Imports, var
/// and const declarations and the package clause only matter as comment
/// owners, so they collapse into `Other`.
#[derive(Debug, Clone)]
pub enum DeclKind {
    Func(FuncDecl),
    Type(TypeDecl),
    Other,
}

/// A function or method declaration.
#[derive(Debug, Clone)]
pub struct FuncDecl {
    pub name: String,
    /// Struct type declarations found at statement level inside the body.
    /// These are never annotated in the default mode; in nested mode their
    /// names are qualified with the function name.
    pub local_types: Vec<TypeDecl>,
}

/// A `type` declaration wrapping one or more specs. Grouped declarations
/// (`type ( ... )`) keep only their first spec; the rest are never candidates.
#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub span: Span,
    pub specs: Vec<TypeSpec>,
}

/// A single `Name <type-expr>` entry of a type declaration.
#[derive(Debug, Clone)]
pub struct TypeSpec {
    pub name: String,
    /// Byte offset one past the declared name.
    pub name_end: Pos,
    pub kind: TypeKind,
    /// Byte offset one past the type expression; for structs, one past the
    /// closing brace. Synthesized annotations are positioned here.
    pub end: Pos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Struct,
    Other,
}
