//! Declaration scanner and annotation synthesizer.
//!
//! Walks the parsed declarations once in document order and, for every
//! exported struct declaration that is eligible, synthesizes a
//! `// @name <Name>` comment group positioned at the end of the type spec and
//! merges it into the owner's comment list through the registry.
//!
//! Structs declared at statement level inside a function body are skipped by
//! default. In nested mode they are annotated instead, with the name
//! qualified by the enclosing function (`GetAppList` + `Res` becomes
//! `GetAppListRes`); when several functions could contain a declaration the
//! first in traversal order wins.

use heck::ToUpperCamelCase;
use log::debug;

use crate::ast::{Comment, CommentGroup, DeclKind, GoFile, Pos, Span, TypeDecl, TypeKind};
use crate::registry::CommentRegistry;

/// Annotates every eligible struct declaration in `file`, mutating the
/// registry. Returns the number of annotations added.
pub fn annotate_file(file: &GoFile, registry: &mut CommentRegistry, nested: bool) -> usize {
    let mut count = 0;
    for decl in &file.decls {
        match &decl.kind {
            DeclKind::Type(type_decl) => {
                count += annotate_type(file, registry, decl.span.start, type_decl, None);
            }
            DeclKind::Func(func) if nested => {
                for local in &func.local_types {
                    count += annotate_type(file, registry, decl.span.start, local, Some(&func.name));
                }
            }
            _ => {}
        }
    }
    count
}

fn annotate_type(
    file: &GoFile,
    registry: &mut CommentRegistry,
    owner: Pos,
    decl: &TypeDecl,
    enclosing: Option<&str>,
) -> usize {
    let Some(spec) = decl.specs.first() else {
        return 0;
    };
    if spec.kind != TypeKind::Struct || !is_exported(&spec.name) {
        return 0;
    }

    let name = match enclosing {
        Some(func) => format!("{}_{}", func, spec.name).to_upper_camel_case(),
        None => spec.name.clone(),
    };
    let expected = format!("@name {name}");

    // Stale annotations adjacent to this declaration are dropped so a renamed
    // struct does not accumulate outdated tags. A prior run's annotation may
    // have been grouped with a doc comment above it, so individual comment
    // records are filtered rather than whole groups.
    registry.retain_owner(owner, |group| {
        if group.synthetic || !is_adjacent(&file.src, group, decl.span) {
            return true;
        }
        group.list.retain(|comment| {
            line_comment_content(comment)
                .map_or(true, |text| !text.starts_with("@name ") || text == expected)
        });
        !group.list.is_empty()
    });

    // Exact match after trim: the declaration already carries the annotation.
    let already_annotated = registry.groups(owner).iter().any(|group| {
        group
            .list
            .iter()
            .any(|comment| line_comment_content(comment) == Some(expected.as_str()))
    });
    if already_annotated {
        return 0;
    }

    debug!("annotating struct {} as {expected}", spec.name);
    registry.attach(owner, CommentGroup::synthesized(spec.end, &expected));
    1
}

/// Content of a single `//` comment with the marker stripped and surrounding
/// whitespace trimmed; `None` for block comments.
fn line_comment_content(comment: &Comment) -> Option<&str> {
    comment.text.strip_prefix("//").map(str::trim)
}

/// Go export rule: a name is exported when its first character is uppercase.
fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_uppercase())
}

/// Whether `group` sits directly against `span`: above it with nothing but
/// whitespace in between, or trailing on its final line.
fn is_adjacent(src: &str, group: &CommentGroup, span: Span) -> bool {
    if group.end() <= span.start {
        src.get(group.end()..span.start)
            .is_some_and(|s| s.chars().all(char::is_whitespace))
    } else if group.pos() >= span.end {
        src.get(span.end..group.pos())
            .is_some_and(|s| !s.contains('\n'))
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::GoParser;
    use std::path::Path;

    fn annotate(src: &str, nested: bool) -> (GoFile, CommentRegistry, usize) {
        let file = GoParser::parse_source(Path::new("test.go"), src).unwrap();
        let mut registry = CommentRegistry::seed(&file);
        let count = annotate_file(&file, &mut registry, nested);
        (file, registry, count)
    }

    fn annotation_texts(registry: &CommentRegistry, owner: Pos) -> Vec<String> {
        registry
            .groups(owner)
            .iter()
            .map(|g| g.text().trim().to_string())
            .filter(|t| t.starts_with("@name"))
            .collect()
    }

    #[test]
    fn test_exported_struct_is_annotated() {
        let src = "package demo\n\ntype GetServiceRes struct {\n\tName string\n}\n";
        let (file, registry, count) = annotate(src, false);
        assert_eq!(count, 1);

        let owner = file.decls[1].span.start;
        let groups = registry.groups(owner);
        assert_eq!(groups.len(), 1);
        assert!(groups[0].synthetic);
        assert_eq!(groups[0].text(), "@name GetServiceRes");
        // Positioned at the end of the type spec.
        assert_eq!(groups[0].pos(), file.decls[1].span.end);
    }

    #[test]
    fn test_unexported_struct_is_skipped() {
        let (_, _, count) = annotate("package demo\n\ntype item struct {\n}\n", false);
        assert_eq!(count, 0);
    }

    #[test]
    fn test_type_alias_is_skipped() {
        let (_, _, count) = annotate("package demo\n\ntype Count int\n", false);
        assert_eq!(count, 0);
    }

    #[test]
    fn test_local_struct_skipped_by_default() {
        let src = "package demo\n\nfunc Foo() {\n\ttype Inner struct {\n\t}\n}\n";
        let (_, _, count) = annotate(src, false);
        assert_eq!(count, 0);
    }

    #[test]
    fn test_local_struct_gets_compound_name_in_nested_mode() {
        let src = "package demo\n\nfunc GetAppList() {\n\ttype Res struct {\n\t}\n}\n";
        let (file, registry, count) = annotate(src, true);
        assert_eq!(count, 1);

        let owner = file.decls[1].span.start;
        assert_eq!(annotation_texts(&registry, owner), vec!["@name GetAppListRes"]);
    }

    #[test]
    fn test_existing_exact_annotation_is_preserved() {
        let src = "package demo\n\n// @name GetServiceRes\ntype GetServiceRes struct {\n}\n";
        let (file, registry, count) = annotate(src, false);
        assert_eq!(count, 0);

        let owner = file
            .decls
            .iter()
            .find(|d| matches!(d.kind, DeclKind::Type(_)))
            .unwrap()
            .span
            .start;
        let groups = registry.groups(owner);
        assert_eq!(groups.len(), 1);
        assert!(!groups[0].synthetic);
    }

    #[test]
    fn test_annotation_grouped_with_doc_comment_is_detected() {
        // A prior run's annotation directly under a doc comment parses as one
        // group; the exact-match check still has to find it.
        let src = "package demo\n\n// doc line\n// @name Alpha\ntype Alpha struct {\n}\n";
        let (_, _, count) = annotate(src, false);
        assert_eq!(count, 0);
    }

    #[test]
    fn test_existing_trailing_annotation_is_preserved() {
        let src = "package demo\n\ntype Name4 struct {\n} // @name Name4\n";
        let (_, _, count) = annotate(src, false);
        assert_eq!(count, 0);
    }

    #[test]
    fn test_stale_annotation_is_replaced() {
        let src = "package demo\n\n// @name OldName\ntype GetServiceRes struct {\n}\n";
        let (file, registry, count) = annotate(src, false);
        assert_eq!(count, 1);

        let owner = file
            .decls
            .iter()
            .find(|d| matches!(d.kind, DeclKind::Type(_)))
            .unwrap()
            .span
            .start;
        assert_eq!(annotation_texts(&registry, owner), vec!["@name GetServiceRes"]);
    }

    #[test]
    fn test_ordinary_doc_comment_is_kept() {
        let src = "package demo\n\n// GetServiceRes is a response.\ntype GetServiceRes struct {\n}\n";
        let (file, registry, count) = annotate(src, false);
        assert_eq!(count, 1);

        let owner = file
            .decls
            .iter()
            .find(|d| matches!(d.kind, DeclKind::Type(_)))
            .unwrap()
            .span
            .start;
        let groups = registry.groups(owner);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].text(), "GetServiceRes is a response.");
        assert_eq!(groups[1].text(), "@name GetServiceRes");
    }

    #[test]
    fn test_annotation_like_field_comment_is_not_removed() {
        // An @name-shaped comment inside the struct body is not adjacent to
        // the declaration and must survive.
        let src =
            "package demo\n\ntype GetServiceRes struct {\n\t// @name something else\n\tName string\n}\n";
        let (file, registry, count) = annotate(src, false);
        assert_eq!(count, 1);

        let owner = file
            .decls
            .iter()
            .find(|d| matches!(d.kind, DeclKind::Type(_)))
            .unwrap()
            .span
            .start;
        assert_eq!(registry.groups(owner).len(), 2);
    }

    #[test]
    fn test_is_exported() {
        assert!(is_exported("GetServiceRes"));
        assert!(!is_exported("item"));
        assert!(!is_exported(""));
        assert!(!is_exported("_private"));
    }
}
