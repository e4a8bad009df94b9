//! Go front end: a comment-aware lexer and a declaration-level parser.
//!
//! The parser only resolves the structure the annotator needs: the package
//! clause, top-level declarations with byte spans, struct type specs, and
//! struct declarations at statement level inside function bodies. Everything
//! else (expressions, statements, field lists) is skipped with balanced
//! delimiter matching. Comments are collected separately into positional
//! groups, mirroring how the model keeps comments on the file rather than on
//! tree nodes.

use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::Path;

use crate::ast::{
    Comment, CommentGroup, Decl, DeclKind, FuncDecl, GoFile, Pos, Span, TypeDecl, TypeKind,
    TypeSpec,
};
use crate::error::ParseError;

/// Parser entry points for Go source files.
pub struct GoParser;

impl GoParser {
    /// Reads and parses a single Go source file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not lex/parse as a
    /// Go compilation unit. Parse diagnostics display as
    /// `file:line:col: message`.
    pub fn parse_file(path: &Path) -> Result<GoFile> {
        debug!("parsing {}", path.display());

        let src = fs::read_to_string(path)
            .with_context(|| format!("failed to read file: {}", path.display()))?;
        let file = Self::parse_source(path, &src)?;

        debug!(
            "parsed package {} ({} declarations, {} comment groups)",
            file.package_name,
            file.decls.len(),
            file.comments.len()
        );
        Ok(file)
    }

    /// Parses Go source text. `path` is only used for diagnostics.
    pub fn parse_source(path: &Path, src: &str) -> std::result::Result<GoFile, ParseError> {
        let lines = LineIndex::new(src);
        let (tokens, comments) = lex(src, path, &lines)?;

        let mut parser = Parser {
            src,
            path,
            lines: &lines,
            tokens: &tokens,
            idx: 0,
        };
        let (package_name, decls) = parser.parse()?;

        Ok(GoFile {
            path: path.to_path_buf(),
            src: src.to_string(),
            package_name,
            decls,
            comments,
        })
    }
}

/// Maps byte offsets to 1-based line/column pairs.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(src: &str) -> Self {
        let mut starts = vec![0];
        for (i, b) in src.bytes().enumerate() {
            if b == b'\n' {
                starts.push(i + 1);
            }
        }
        Self { starts }
    }

    fn location(&self, pos: usize) -> (u32, u32) {
        let line = self.starts.partition_point(|&s| s <= pos);
        let start = self.starts[line - 1];
        (line as u32, (pos - start + 1) as u32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokKind {
    Ident,
    Literal,
    Punct(char),
}

#[derive(Debug, Clone, Copy)]
struct Token {
    kind: TokKind,
    start: Pos,
    end: Pos,
    line: u32,
}

/// Comment group under construction during lexing.
struct GroupState {
    group: CommentGroup,
    end_line: u32,
    /// Whether the last comment pushed was the first thing on its line.
    leading: bool,
    /// Token count at the time the group was last extended; a new token in
    /// between breaks the group.
    toks_at: usize,
}

fn push_comment(
    pending: &mut Option<GroupState>,
    groups: &mut Vec<CommentGroup>,
    comment: Comment,
    start_line: u32,
    end_line: u32,
    at_line_start: bool,
    toks_len: usize,
) {
    // A comment joins the pending group when no token intervened and it sits
    // on the same line or directly below a line-leading comment. A trailing
    // comment never absorbs the next line's comment.
    let joins = pending.as_ref().is_some_and(|p| {
        p.toks_at == toks_len
            && (start_line == p.end_line || (start_line == p.end_line + 1 && p.leading))
    });

    if joins {
        let state = pending.as_mut().expect("pending checked above");
        state.group.list.push(comment);
        state.end_line = end_line;
        state.leading = at_line_start;
    } else {
        if let Some(prev) = pending.take() {
            groups.push(prev.group);
        }
        *pending = Some(GroupState {
            group: CommentGroup {
                list: vec![comment],
                synthetic: false,
            },
            end_line,
            leading: at_line_start,
            toks_at: toks_len,
        });
    }
}

fn lex_err(path: &Path, lines: &LineIndex, pos: usize, message: &str) -> ParseError {
    let (line, col) = lines.location(pos);
    ParseError::new(path, line, col, message)
}

#[allow(clippy::type_complexity)]
fn lex(
    src: &str,
    path: &Path,
    lines: &LineIndex,
) -> std::result::Result<(Vec<Token>, Vec<CommentGroup>), ParseError> {
    let mut tokens = Vec::new();
    let mut groups = Vec::new();
    let mut pending: Option<GroupState> = None;

    let mut i = 0usize;
    let mut line = 1u32;
    let mut at_line_start = true;

    while i < src.len() {
        let ch = match src[i..].chars().next() {
            Some(c) => c,
            None => break,
        };

        if ch == '\n' {
            line += 1;
            at_line_start = true;
            i += 1;
            continue;
        }
        if ch.is_whitespace() {
            i += ch.len_utf8();
            continue;
        }

        if src[i..].starts_with("//") {
            let end = src[i..].find('\n').map_or(src.len(), |j| i + j);
            push_comment(
                &mut pending,
                &mut groups,
                Comment {
                    slash: i,
                    text: src[i..end].to_string(),
                },
                line,
                line,
                at_line_start,
                tokens.len(),
            );
            at_line_start = false;
            i = end;
            continue;
        }

        if src[i..].starts_with("/*") {
            let close = src[i + 2..]
                .find("*/")
                .ok_or_else(|| lex_err(path, lines, i, "comment not terminated"))?;
            let end = i + 2 + close + 2;
            let newlines = src[i..end].matches('\n').count() as u32;
            push_comment(
                &mut pending,
                &mut groups,
                Comment {
                    slash: i,
                    text: src[i..end].to_string(),
                },
                line,
                line + newlines,
                at_line_start,
                tokens.len(),
            );
            line += newlines;
            at_line_start = false;
            i = end;
            continue;
        }

        match ch {
            '"' | '\'' => {
                let quote = ch;
                let start = i;
                let mut j = i + 1;
                let mut closed = false;
                while j < src.len() {
                    let c = match src[j..].chars().next() {
                        Some(c) => c,
                        None => break,
                    };
                    match c {
                        '\\' => {
                            j += 1;
                            if let Some(esc) = src[j..].chars().next() {
                                j += esc.len_utf8();
                            }
                        }
                        '\n' => break,
                        c if c == quote => {
                            j += 1;
                            closed = true;
                            break;
                        }
                        c => j += c.len_utf8(),
                    }
                }
                if !closed {
                    let what = if quote == '"' { "string" } else { "rune" };
                    return Err(lex_err(
                        path,
                        lines,
                        start,
                        &format!("{what} literal not terminated"),
                    ));
                }
                tokens.push(Token {
                    kind: TokKind::Literal,
                    start,
                    end: j,
                    line,
                });
                at_line_start = false;
                i = j;
            }
            '`' => {
                let start = i;
                let close = src[i + 1..]
                    .find('`')
                    .ok_or_else(|| lex_err(path, lines, start, "raw string literal not terminated"))?;
                let end = i + 1 + close + 1;
                let tok_line = line;
                line += src[start..end].matches('\n').count() as u32;
                tokens.push(Token {
                    kind: TokKind::Literal,
                    start,
                    end,
                    line: tok_line,
                });
                at_line_start = false;
                i = end;
            }
            c if c == '_' || c.is_alphabetic() => {
                let start = i;
                let mut end = i;
                for (off, c2) in src[i..].char_indices() {
                    if c2 == '_' || c2.is_alphanumeric() {
                        end = i + off + c2.len_utf8();
                    } else {
                        break;
                    }
                }
                tokens.push(Token {
                    kind: TokKind::Ident,
                    start,
                    end,
                    line,
                });
                at_line_start = false;
                i = end;
            }
            c if c.is_ascii_digit() => {
                let start = i;
                let mut end = i;
                for (off, c2) in src[i..].char_indices() {
                    if c2.is_ascii_alphanumeric() || c2 == '.' || c2 == '_' {
                        end = i + off + c2.len_utf8();
                    } else {
                        break;
                    }
                }
                tokens.push(Token {
                    kind: TokKind::Literal,
                    start,
                    end,
                    line,
                });
                at_line_start = false;
                i = end;
            }
            c => {
                tokens.push(Token {
                    kind: TokKind::Punct(c),
                    start: i,
                    end: i + c.len_utf8(),
                    line,
                });
                at_line_start = false;
                i += c.len_utf8();
            }
        }
    }

    if let Some(state) = pending.take() {
        groups.push(state.group);
    }
    Ok((tokens, groups))
}

struct Parser<'a> {
    src: &'a str,
    path: &'a Path,
    lines: &'a LineIndex,
    tokens: &'a [Token],
    idx: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.idx).copied()
    }

    fn peek_n(&self, n: usize) -> Option<Token> {
        self.tokens.get(self.idx + n).copied()
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.peek();
        if tok.is_some() {
            self.idx += 1;
        }
        tok
    }

    fn text(&self, tok: Token) -> &str {
        &self.src[tok.start..tok.end]
    }

    fn is_ident(&self, tok: Token, name: &str) -> bool {
        tok.kind == TokKind::Ident && self.text(tok) == name
    }

    fn peek_is_punct(&self, c: char) -> bool {
        matches!(self.peek(), Some(t) if t.kind == TokKind::Punct(c))
    }

    fn eat_punct(&mut self, c: char) -> bool {
        if self.peek_is_punct(c) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn err_at(&self, pos: Pos, message: impl Into<String>) -> ParseError {
        let (line, col) = self.lines.location(pos);
        ParseError::new(self.path, line, col, message.into())
    }

    fn err_here(&self, message: impl Into<String>) -> ParseError {
        let pos = self.peek().map_or(self.src.len(), |t| t.start);
        self.err_at(pos, message)
    }

    fn expect_ident(&mut self, what: &str) -> std::result::Result<Token, ParseError> {
        match self.peek() {
            Some(t) if t.kind == TokKind::Ident => {
                self.bump();
                Ok(t)
            }
            _ => Err(self.err_here(format!("expected {what}"))),
        }
    }

    fn expect_punct(&mut self, c: char) -> std::result::Result<Token, ParseError> {
        match self.peek() {
            Some(t) if t.kind == TokKind::Punct(c) => {
                self.bump();
                Ok(t)
            }
            _ => Err(self.err_here(format!("expected '{c}'"))),
        }
    }

    /// Consumes a balanced `open`..`close` run, returning the end offset of
    /// the closing delimiter. The opening delimiter must be next.
    fn skip_balanced(&mut self, open: char, close: char) -> std::result::Result<Pos, ParseError> {
        let first = self.expect_punct(open)?;
        let mut depth = 1usize;
        while let Some(tok) = self.bump() {
            if let TokKind::Punct(c) = tok.kind {
                if c == open {
                    depth += 1;
                } else if c == close {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(tok.end);
                    }
                }
            }
        }
        Err(self.err_at(first.start, format!("missing closing '{close}'")))
    }

    /// Consumes the remainder of a simple (non-braced) declaration: tokens up
    /// to the first line break at balanced delimiter depth, an explicit
    /// semicolon, or an unmatched closer belonging to an enclosing group.
    fn skip_to_line_end(&mut self, first: Token) -> Pos {
        let mut last = first;
        let mut depth = [0i32; 3];
        while let Some(tok) = self.peek() {
            if depth == [0, 0, 0] {
                if tok.line > last.line {
                    break;
                }
                match tok.kind {
                    TokKind::Punct(';') => {
                        self.bump();
                        last = tok;
                        break;
                    }
                    TokKind::Punct(')') | TokKind::Punct(']') | TokKind::Punct('}') => break,
                    _ => {}
                }
            }
            self.bump();
            match tok.kind {
                TokKind::Punct('(') => depth[0] += 1,
                TokKind::Punct(')') => depth[0] -= 1,
                TokKind::Punct('[') => depth[1] += 1,
                TokKind::Punct(']') => depth[1] -= 1,
                TokKind::Punct('{') => depth[2] += 1,
                TokKind::Punct('}') => depth[2] -= 1,
                _ => {}
            }
            last = tok;
        }
        last.end
    }

    fn parse(&mut self) -> std::result::Result<(String, Vec<Decl>), ParseError> {
        let mut decls = Vec::new();

        let pkg = match self.peek() {
            Some(t) if self.is_ident(t, "package") => t,
            Some(t) => return Err(self.err_at(t.start, "expected 'package' clause")),
            None => return Err(self.err_at(0, "expected 'package' clause")),
        };
        self.bump();
        let name_tok = self.expect_ident("package name")?;
        let package_name = self.text(name_tok).to_string();
        decls.push(Decl {
            span: Span::new(pkg.start, name_tok.end),
            kind: DeclKind::Other,
        });

        while let Some(tok) = self.peek() {
            if tok.kind == TokKind::Punct(';') {
                self.bump();
            } else if self.is_ident(tok, "import") {
                self.bump();
                decls.push(self.parse_import(tok)?);
            } else if self.is_ident(tok, "type") {
                self.bump();
                decls.push(self.parse_type_decl(tok)?);
            } else if self.is_ident(tok, "func") {
                self.bump();
                decls.push(self.parse_func(tok)?);
            } else if self.is_ident(tok, "var") || self.is_ident(tok, "const") {
                self.bump();
                decls.push(self.parse_value_decl(tok)?);
            } else {
                let found = self.text(tok).to_string();
                return Err(self.err_at(tok.start, format!("expected declaration, found '{found}'")));
            }
        }

        Ok((package_name, decls))
    }

    fn parse_import(&mut self, kw: Token) -> std::result::Result<Decl, ParseError> {
        let mut end = kw.end;
        if self.peek_is_punct('(') {
            end = self.skip_balanced('(', ')')?;
        } else {
            // Optional alias (identifier, '.' or '_') followed by the path.
            while let Some(tok) = self.bump() {
                end = tok.end;
                if tok.kind == TokKind::Literal {
                    break;
                }
                let alias = tok.kind == TokKind::Ident || tok.kind == TokKind::Punct('.');
                if !alias {
                    return Err(self.err_at(tok.start, "expected import path"));
                }
            }
        }
        Ok(Decl {
            span: Span::new(kw.start, end),
            kind: DeclKind::Other,
        })
    }

    fn parse_value_decl(&mut self, kw: Token) -> std::result::Result<Decl, ParseError> {
        let end = if self.peek_is_punct('(') {
            self.skip_balanced('(', ')')?
        } else {
            self.skip_to_line_end(kw)
        };
        Ok(Decl {
            span: Span::new(kw.start, end),
            kind: DeclKind::Other,
        })
    }

    fn parse_type_decl(&mut self, kw: Token) -> std::result::Result<Decl, ParseError> {
        if self.peek_is_punct('(') {
            let open = self.expect_punct('(')?;
            let mut specs = Vec::new();
            if matches!(self.peek(), Some(t) if t.kind == TokKind::Ident) {
                // Only the first spec of a grouped declaration is a candidate.
                specs.push(self.parse_type_spec()?);
            }
            let mut depth = 1usize;
            let mut end = open.end;
            while depth > 0 {
                let Some(tok) = self.bump() else {
                    return Err(self.err_at(open.start, "missing closing ')'"));
                };
                end = tok.end;
                if let TokKind::Punct(c) = tok.kind {
                    if c == '(' {
                        depth += 1;
                    } else if c == ')' {
                        depth -= 1;
                    }
                }
            }
            let span = Span::new(kw.start, end);
            Ok(Decl {
                span,
                kind: DeclKind::Type(TypeDecl { span, specs }),
            })
        } else {
            let spec = self.parse_type_spec()?;
            let span = Span::new(kw.start, spec.end);
            Ok(Decl {
                span,
                kind: DeclKind::Type(TypeDecl {
                    span,
                    specs: vec![spec],
                }),
            })
        }
    }

    fn parse_type_spec(&mut self) -> std::result::Result<TypeSpec, ParseError> {
        let name_tok = self.expect_ident("type name")?;
        let name = self.text(name_tok).to_string();

        // Type parameters or an array length, either way balanced brackets.
        if self.peek_is_punct('[') {
            self.skip_balanced('[', ']')?;
        }
        self.eat_punct('=');

        let is_struct = matches!(self.peek(), Some(t) if self.is_ident(t, "struct"))
            && matches!(self.peek_n(1), Some(t) if t.kind == TokKind::Punct('{'));
        if is_struct {
            self.bump();
            let end = self.skip_balanced('{', '}')?;
            Ok(TypeSpec {
                name,
                name_end: name_tok.end,
                kind: TypeKind::Struct,
                end,
            })
        } else {
            let end = self.skip_to_line_end(name_tok);
            Ok(TypeSpec {
                name,
                name_end: name_tok.end,
                kind: TypeKind::Other,
                end,
            })
        }
    }

    fn parse_func(&mut self, kw: Token) -> std::result::Result<Decl, ParseError> {
        if self.peek_is_punct('(') {
            // Method receiver.
            self.skip_balanced('(', ')')?;
        }
        let name_tok = self.expect_ident("function name")?;
        let name = self.text(name_tok).to_string();

        loop {
            let Some(tok) = self.peek() else { break };
            let prev = self.tokens[self.idx - 1];
            if tok.line > prev.line {
                // Signature ended without a body on its line: a declaration
                // implemented elsewhere (assembly or linkname).
                break;
            }
            match tok.kind {
                TokKind::Punct('{') => {
                    let literal = prev.kind == TokKind::Ident
                        && matches!(self.text(prev), "struct" | "interface");
                    if literal {
                        // struct/interface type literal in the result list.
                        self.skip_balanced('{', '}')?;
                    } else {
                        let (end, local_types) = self.parse_func_body()?;
                        let span = Span::new(kw.start, end);
                        return Ok(Decl {
                            span,
                            kind: DeclKind::Func(FuncDecl { name, local_types }),
                        });
                    }
                }
                TokKind::Punct('(') => {
                    self.skip_balanced('(', ')')?;
                }
                TokKind::Punct('[') => {
                    self.skip_balanced('[', ']')?;
                }
                _ => {
                    self.bump();
                }
            }
        }

        let end = self.tokens[self.idx - 1].end;
        Ok(Decl {
            span: Span::new(kw.start, end),
            kind: DeclKind::Func(FuncDecl {
                name,
                local_types: Vec::new(),
            }),
        })
    }

    /// Consumes a function body, collecting statement-level struct type
    /// declarations on the way.
    fn parse_func_body(&mut self) -> std::result::Result<(Pos, Vec<TypeDecl>), ParseError> {
        let open = self.expect_punct('{')?;
        let mut depth = 1usize;
        let mut local_types = Vec::new();

        while let Some(tok) = self.bump() {
            match tok.kind {
                TokKind::Punct('{') => depth += 1,
                TokKind::Punct('}') => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok((tok.end, local_types));
                    }
                }
                TokKind::Ident if self.text(tok) == "type" => {
                    let is_struct_decl = matches!(self.peek(), Some(t) if t.kind == TokKind::Ident)
                        && matches!(self.peek_n(1), Some(t) if self.is_ident(t, "struct"))
                        && matches!(self.peek_n(2), Some(t) if t.kind == TokKind::Punct('{'));
                    if is_struct_decl {
                        let name_tok = self.expect_ident("type name")?;
                        self.bump(); // struct
                        let end = self.skip_balanced('{', '}')?;
                        local_types.push(TypeDecl {
                            span: Span::new(tok.start, end),
                            specs: vec![TypeSpec {
                                name: self.text(name_tok).to_string(),
                                name_end: name_tok.end,
                                kind: TypeKind::Struct,
                                end,
                            }],
                        });
                    }
                }
                _ => {}
            }
        }
        Err(self.err_at(open.start, "missing closing '}'"))
    }
}
