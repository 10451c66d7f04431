use crate::domain::{comments::tree::CommentNode, user::display_name};
use std::fmt::Write;
use uuid::Uuid;

const INDENT: &str = "    ";

/// Plain-text rendering of a comment tree, one block per comment.
///
/// `viewer` marks the viewer's own comments, which are the ones they may edit
/// or delete.
pub fn render_tree(nodes: &[CommentNode], viewer: Option<Uuid>) -> String {
    if nodes.is_empty() {
        return "No comments yet. Be the first to comment!\n".to_string();
    }

    let total: usize = nodes.iter().map(CommentNode::total_count).sum();
    let mut out = format!(
        "{} {}\n\n",
        total,
        if total == 1 { "comment" } else { "comments" }
    );

    // Explicit stack so very deep threads do not recurse.
    let mut stack: Vec<&CommentNode> = nodes.iter().rev().collect();
    while let Some(node) = stack.pop() {
        render_node(&mut out, node, viewer);
        stack.extend(node.replies.iter().rev());
    }
    out
}

fn render_node(out: &mut String, node: &CommentNode, viewer: Option<Uuid>) {
    let indent = INDENT.repeat(node.depth as usize);
    let comment = &node.comment.comment;

    let mut header = format!(
        "{} · {} · ♥ {}",
        display_name(node.comment.author.as_ref()),
        comment.created_at.format("%b %-d, %Y"),
        node.comment.reactions.like
    );
    if viewer == Some(comment.author_id) {
        header.push_str(" · (you)");
    }
    if comment.updated_at > comment.created_at {
        header.push_str(" · edited");
    }

    let _ = writeln!(out, "{}{}  [{}]", indent, header, comment.id);
    for line in comment.content.lines() {
        let _ = writeln!(out, "{}  {}", indent, line);
    }
    if node.can_reply() {
        let _ = writeln!(out, "{}  ↳ reply", indent);
    }
    out.push('\n');
}
