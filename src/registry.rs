//! Comment registry: the owner-to-comment-groups mapping that carries every
//! comment through mutation and back into the file's flat list.
//!
//! Ownership is purely positional. A group belongs to the declaration it sits
//! inside, the declaration whose last line it trails, or the next declaration
//! it precedes; groups after the last declaration fall back to a file-level
//! tail list. The registry is the sole channel through which comments survive
//! rendering: a group dropped here never reaches the output.

use std::collections::BTreeMap;

use crate::ast::{CommentGroup, GoFile, Pos};

/// File-scoped mapping from owner declaration (keyed by its start offset) to
/// its ordered list of comment groups.
#[derive(Debug, Default)]
pub struct CommentRegistry {
    attached: BTreeMap<Pos, Vec<CommentGroup>>,
    /// Groups not reachable from any declaration (after the last one).
    tail: Vec<CommentGroup>,
}

impl CommentRegistry {
    /// Seeds the registry from a parsed file, assigning every comment group
    /// to an owner by position.
    pub fn seed(file: &GoFile) -> Self {
        let mut registry = Self::default();
        for group in &file.comments {
            match owner_of(file, group) {
                Some(owner) => registry
                    .attached
                    .entry(owner)
                    .or_default()
                    .push(group.clone()),
                None => registry.tail.push(group.clone()),
            }
        }
        registry
    }

    /// The ordered comment groups currently attached to `owner`.
    pub fn groups(&self, owner: Pos) -> &[CommentGroup] {
        self.attached.get(&owner).map_or(&[], |groups| groups.as_slice())
    }

    /// Edits the groups attached to `owner` in place, dropping those for
    /// which `keep` returns false.
    pub fn retain_owner<F>(&mut self, owner: Pos, keep: F)
    where
        F: FnMut(&mut CommentGroup) -> bool,
    {
        if let Some(groups) = self.attached.get_mut(&owner) {
            groups.retain_mut(keep);
        }
    }

    /// Merges a synthesized group into the owner's ordered list.
    ///
    /// Groups positioned strictly before `doc` keep their order and precede
    /// it; a group at exactly `doc`'s position is replaced (this is what makes
    /// re-annotation idempotent, since the synthesized position is
    /// deterministic); `doc` lands exactly once before the first group
    /// positioned after it, or at the end.
    pub fn attach(&mut self, owner: Pos, doc: CommentGroup) {
        let groups = self.attached.entry(owner).or_default();
        let pos = doc.pos();
        for i in 0..groups.len() {
            match groups[i].pos().cmp(&pos) {
                std::cmp::Ordering::Less => continue,
                std::cmp::Ordering::Equal => {
                    groups[i] = doc;
                    return;
                }
                std::cmp::Ordering::Greater => {
                    groups.insert(i, doc);
                    return;
                }
            }
        }
        groups.push(doc);
    }

    /// Flattens the registry back into a file-level comment list, sorted by
    /// position with end offset as tie-break.
    pub fn into_comments(self) -> Vec<CommentGroup> {
        let mut all: Vec<CommentGroup> = self
            .attached
            .into_values()
            .flatten()
            .chain(self.tail)
            .collect();
        all.sort_by(|a, b| a.pos().cmp(&b.pos()).then(a.end().cmp(&b.end())));
        all
    }
}

/// Resolves the owning declaration for a comment group: the first declaration
/// it precedes, the declaration containing it, or the declaration whose end
/// line it trails.
fn owner_of(file: &GoFile, group: &CommentGroup) -> Option<Pos> {
    let pos = group.pos();
    for decl in &file.decls {
        if pos < decl.span.start {
            return Some(decl.span.start);
        }
        if pos < decl.span.end {
            return Some(decl.span.start);
        }
        // Trailing comment on the declaration's last line.
        let between = file.src.get(decl.span.end..pos);
        if between.is_some_and(|s| !s.contains('\n')) {
            return Some(decl.span.start);
        }
    }
    None
}
