use super::comment::EnrichedComment;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;
use ts_rs::TS;
use uuid::Uuid;

/// Replies are offered only above this depth. The tree itself is unbounded.
pub const MAX_REPLY_DEPTH: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CommentNode {
    #[serde(flatten)]
    pub comment: EnrichedComment,
    /// 0 for top-level comments.
    pub depth: u32,
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    pub fn can_reply(&self) -> bool {
        self.depth < MAX_REPLY_DEPTH
    }

    /// This node plus every reply below it.
    pub fn total_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.replies.iter());
        }
        count
    }
}

/// Nest a flat comment list into reply threads.
///
/// Top-level comments are sorted newest first. Replies keep the order they had
/// in `comments`. A comment whose parent is not part of `comments` is dropped,
/// as is anything that can only be reached through such a comment. When an id
/// appears twice the first occurrence wins.
pub fn build_comment_tree(comments: Vec<EnrichedComment>) -> Vec<CommentNode> {
    let mut index: HashMap<Uuid, usize> = HashMap::with_capacity(comments.len());
    for (position, comment) in comments.iter().enumerate() {
        index.entry(comment.id()).or_insert(position);
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); comments.len()];
    let mut roots = Vec::new();
    for (position, comment) in comments.iter().enumerate() {
        if index.get(&comment.id()) != Some(&position) {
            debug!(comment_id = %comment.id(), "Skipping duplicate comment id");
            continue;
        }
        match comment.comment.parent_comment_id {
            None => roots.push(position),
            Some(parent_id) => match index.get(&parent_id) {
                Some(&parent) if parent != position => children[parent].push(position),
                _ => debug!(
                    comment_id = %comment.id(),
                    parent_id = %parent_id,
                    "Dropping orphaned reply"
                ),
            },
        }
    }

    // Pre-order walk from the roots. Anything not visited here is unreachable
    // and stays out of the tree.
    let mut depths = vec![0u32; comments.len()];
    let mut visit_order = Vec::with_capacity(comments.len());
    let mut stack = roots.clone();
    while let Some(position) = stack.pop() {
        visit_order.push(position);
        for &child in &children[position] {
            depths[child] = depths[position] + 1;
            stack.push(child);
        }
    }

    // Reverse pre-order finishes every child before its parent.
    let mut pending: Vec<Option<EnrichedComment>> = comments.into_iter().map(Some).collect();
    let mut built: Vec<Option<CommentNode>> = (0..pending.len()).map(|_| None).collect();
    for &position in visit_order.iter().rev() {
        let Some(comment) = pending[position].take() else {
            continue;
        };
        let replies = children[position]
            .iter()
            .filter_map(|&child| built[child].take())
            .collect();
        built[position] = Some(CommentNode {
            comment,
            depth: depths[position],
            replies,
        });
    }

    let mut tree: Vec<CommentNode> = roots
        .iter()
        .filter_map(|&root| built[root].take())
        .collect();
    tree.sort_by(|a, b| b.comment.comment.created_at.cmp(&a.comment.comment.created_at));
    tree
}
