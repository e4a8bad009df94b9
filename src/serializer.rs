//! Rendering and whitespace normalization.
//!
//! The renderer reconciles the final comment list against the original source
//! text: comment records that survived the registry stay byte-identical in
//! place, dropped records are excised individually, and synthesized groups are
//! emitted directly above the declaration that owns their position. All
//! non-comment bytes are reproduced exactly. Two textual passes follow, in
//! order: trailing spaces and tabs are stripped from every line, then runs of
//! three or more newlines collapse to exactly two (one blank line).

use anyhow::{Context, Result};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::ops::Range;
use std::path::Path;

use crate::ast::{CommentGroup, GoFile, Pos};

static TRAILING_WS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)[ \t]+$").expect("trailing whitespace pattern"));
static EXTRA_BLANK_LINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("blank line pattern"));

/// Renders the file with `comments` as its final comment list and applies the
/// whitespace normalization passes.
pub fn render(file: &GoFile, comments: &[CommentGroup]) -> String {
    let src = &file.src;

    // Retention is per comment record, not per group: the annotator may drop
    // a single stale record out of a multi-comment group, and that record must
    // disappear from the output even though its siblings stay.
    let retained: HashSet<Pos> = comments
        .iter()
        .filter(|g| !g.synthetic)
        .flat_map(|g| g.list.iter().map(|c| c.slash))
        .collect();

    // Edits are byte-range replacements against the original text, applied
    // back to front so earlier offsets stay valid.
    let mut edits: Vec<(Range<usize>, String)> = Vec::new();

    for group in &file.comments {
        for comment in &group.list {
            if !retained.contains(&comment.slash) {
                edits.push((removal_range(src, comment.slash, comment.end()), String::new()));
            }
        }
    }

    for group in comments.iter().filter(|g| g.synthetic) {
        let Some(anchor) = file.anchor_for(group.pos()) else {
            continue;
        };
        let line_start = src[..anchor].rfind('\n').map_or(0, |i| i + 1);
        let prefix = &src[line_start..anchor];
        let indent = if prefix.chars().all(|c| c == ' ' || c == '\t') {
            prefix
        } else {
            ""
        };
        let mut text = String::new();
        for comment in &group.list {
            text.push_str(indent);
            text.push_str(&comment.text);
            text.push('\n');
        }
        edits.push((line_start..line_start, text));
    }

    edits.sort_by(|a, b| (a.0.start, a.0.end).cmp(&(b.0.start, b.0.end)));

    let mut out = src.clone();
    for (range, replacement) in edits.into_iter().rev() {
        out.replace_range(range, &replacement);
    }

    postprocess(&out)
}

/// The byte range to delete for a removed comment record: the whole line run
/// when the record is the only content on its lines, otherwise just the span.
fn removal_range(src: &str, start: Pos, end: Pos) -> Range<usize> {
    let line_start = src[..start].rfind('\n').map_or(0, |i| i + 1);
    let prefix_blank = src[line_start..start].chars().all(|c| c == ' ' || c == '\t');
    let line_end = src[end..].find('\n').map(|i| end + i);
    let suffix_blank = match line_end {
        Some(le) => src[end..le].chars().all(|c| c == ' ' || c == '\t'),
        None => src[end..].chars().all(|c| c == ' ' || c == '\t'),
    };

    if prefix_blank && suffix_blank {
        match line_end {
            Some(le) => line_start..le + 1,
            None => line_start..src.len(),
        }
    } else {
        start..end
    }
}

/// Strips trailing whitespace, collapses 2+ blank lines to one, and ends the
/// text with a single newline. Order matters: stripping first turns
/// whitespace-only lines into empty ones so the collapse sees them.
pub fn postprocess(text: &str) -> String {
    let stripped = TRAILING_WS.replace_all(text, "");
    let collapsed = EXTRA_BLANK_LINES.replace_all(&stripped, "\n\n");
    let mut out = collapsed.trim_end_matches('\n').to_string();
    out.push('\n');
    out
}

/// Writes transformed source back to its original path with fixed 0644 mode
/// bits.
pub fn write_in_place(content: &str, path: &Path) -> Result<()> {
    debug!("writing {} bytes to {}", content.len(), path.display());
    fs::write(path, content)
        .with_context(|| format!("failed to write to file: {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o644))
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotator::annotate_file;
    use crate::parser::GoParser;
    use crate::registry::CommentRegistry;
    use pretty_assertions::assert_eq;

    fn rewrite(src: &str, nested: bool) -> String {
        let file = GoParser::parse_source(Path::new("test.go"), src).unwrap();
        let mut registry = CommentRegistry::seed(&file);
        annotate_file(&file, &mut registry, nested);
        let comments = registry.into_comments();
        render(&file, &comments)
    }

    #[test]
    fn test_annotation_inserted_directly_above_declaration() {
        let src = "package demo\n\ntype GetServiceRes struct {\n\tName string\n}\n";
        let out = rewrite(src, false);
        assert_eq!(
            out,
            "package demo\n\n// @name GetServiceRes\ntype GetServiceRes struct {\n\tName string\n}\n"
        );
    }

    #[test]
    fn test_existing_comments_keep_their_order() {
        let src = "package demo\n\n// doc one\n// doc two\ntype Alpha struct {\n} // trailing\n";
        let out = rewrite(src, false);
        assert_eq!(
            out,
            "package demo\n\n// doc one\n// doc two\n// @name Alpha\ntype Alpha struct {\n} // trailing\n"
        );
    }

    #[test]
    fn test_stale_annotation_line_is_removed() {
        let src = "package demo\n\n// @name OldName\ntype Alpha struct {\n}\n";
        let out = rewrite(src, false);
        assert_eq!(out, "package demo\n\n// @name Alpha\ntype Alpha struct {\n}\n");
    }

    #[test]
    fn test_stale_annotation_under_doc_comment_is_removed() {
        // The stale record sits in the same comment group as the doc line;
        // only the record disappears, the doc line stays.
        let src = "package demo\n\n// doc line\n// @name OldName\ntype Alpha struct {\n}\n";
        let out = rewrite(src, false);
        assert_eq!(
            out,
            "package demo\n\n// doc line\n// @name Alpha\ntype Alpha struct {\n}\n"
        );
        assert_eq!(rewrite(&out, false), out);
    }

    #[test]
    fn test_exact_annotation_left_untouched() {
        let src = "package demo\n\n// @name Alpha\ntype Alpha struct {\n}\n";
        assert_eq!(rewrite(src, false), src);
    }

    #[test]
    fn test_trailing_exact_annotation_left_untouched() {
        let src = "package demo\n\ntype Name4 struct {\n} // @name Name4\n";
        assert_eq!(rewrite(src, false), src);
    }

    #[test]
    fn test_nested_annotation_indented_to_declaration() {
        let src = "package demo\n\nfunc GetAppList() {\n\ttype Res struct {\n\t}\n}\n";
        let out = rewrite(src, true);
        assert_eq!(
            out,
            "package demo\n\nfunc GetAppList() {\n\t// @name GetAppListRes\n\ttype Res struct {\n\t}\n}\n"
        );
    }

    #[test]
    fn test_postprocess_strips_trailing_whitespace() {
        assert_eq!(postprocess("a  \nb\t\nc\n"), "a\nb\nc\n");
    }

    #[test]
    fn test_postprocess_collapses_blank_lines() {
        assert_eq!(postprocess("a\n\n\n\n\nb\n"), "a\n\nb\n");
    }

    #[test]
    fn test_postprocess_single_trailing_newline() {
        assert_eq!(postprocess("a\n\n\n"), "a\n");
        assert_eq!(postprocess("a"), "a\n");
    }

    #[test]
    fn test_blank_lines_between_declarations_collapse() {
        let src = "package demo\n\n\n\n\ntype Alpha struct {\n}\n";
        let out = rewrite(src, false);
        assert_eq!(out, "package demo\n\n// @name Alpha\ntype Alpha struct {\n}\n");
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let src = "package demo\n\n// doc\ntype Alpha struct {\n} // note\n\ntype beta struct {\n}\n";
        let once = rewrite(src, false);
        let twice = rewrite(&once, false);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_write_in_place_sets_content() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out.go");
        write_in_place("package demo\n", &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "package demo\n");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o644);
        }
    }
}
