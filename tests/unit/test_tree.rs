use chrono::{DateTime, Duration, TimeZone, Utc};
use comments::domain::comments::{
    comment::{Comment, EnrichedComment},
    reaction::ReactionCounts,
    tree::{CommentNode, build_comment_tree},
};
use std::collections::HashSet;
use uuid::Uuid;

fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap() + Duration::minutes(minutes)
}

fn comment(id: u128, parent: Option<u128>, created_at: DateTime<Utc>) -> EnrichedComment {
    EnrichedComment {
        comment: Comment {
            id: Uuid::from_u128(id),
            post_slug: "tree-post".to_string(),
            author_id: Uuid::from_u128(1000),
            parent_comment_id: parent.map(Uuid::from_u128),
            content: format!("#{}", id),
            is_approved: true,
            is_deleted: false,
            created_at,
            updated_at: created_at,
        },
        author: None,
        reactions: ReactionCounts::default(),
    }
}

/// (id, reply ids) pairs, depth first, for compact assertions.
fn shape(nodes: &[CommentNode]) -> Vec<(u128, Vec<u128>)> {
    let mut out = Vec::new();
    let mut stack: Vec<&CommentNode> = nodes.iter().rev().collect();
    while let Some(node) = stack.pop() {
        out.push((
            node.comment.id().as_u128(),
            node.replies.iter().map(|r| r.comment.id().as_u128()).collect(),
        ));
        stack.extend(node.replies.iter().rev());
    }
    out
}

fn all_ids(nodes: &[CommentNode]) -> Vec<Uuid> {
    let mut ids = Vec::new();
    let mut stack: Vec<&CommentNode> = nodes.iter().collect();
    while let Some(node) = stack.pop() {
        ids.push(node.comment.id());
        stack.extend(node.replies.iter());
    }
    ids
}

#[test]
fn nests_reply_and_sorts_roots_newest_first() {
    let t1 = at(1);
    let t2 = at(2);
    let t3 = at(3);
    let tree = build_comment_tree(vec![
        comment(1, None, t2),
        comment(2, Some(1), t1),
        comment(3, None, t3),
    ]);

    assert_eq!(shape(&tree), vec![(3, vec![]), (1, vec![2]), (2, vec![])]);
    assert_eq!(tree[0].replies.len(), 0);
    assert_eq!(tree[1].replies[0].depth, 1);
}

#[test]
fn orphaned_reply_is_dropped_not_promoted() {
    let tree = build_comment_tree(vec![
        comment(1, None, at(1)),
        comment(2, Some(404), at(2)),
        comment(3, Some(2), at(3)),
    ]);

    assert_eq!(shape(&tree), vec![(1, vec![])]);
}

#[test]
fn replies_keep_input_order_even_when_older_first() {
    // Replies arrive oldest first here; they must not be re-sorted.
    let tree = build_comment_tree(vec![
        comment(1, None, at(0)),
        comment(2, Some(1), at(1)),
        comment(3, Some(1), at(5)),
        comment(4, Some(1), at(3)),
    ]);

    let reply_ids: Vec<u128> = tree[0]
        .replies
        .iter()
        .map(|r| r.comment.id().as_u128())
        .collect();
    assert_eq!(reply_ids, vec![2, 3, 4]);
}

#[test]
fn roots_with_equal_timestamps_keep_input_order() {
    let tree = build_comment_tree(vec![
        comment(5, None, at(1)),
        comment(6, None, at(1)),
        comment(7, None, at(2)),
    ]);
    assert_eq!(shape(&tree), vec![(7, vec![]), (5, vec![]), (6, vec![])]);
}

#[test]
fn deep_chains_are_supported() {
    let depth = 1_000u128;
    let mut flat: Vec<EnrichedComment> = (1..=depth)
        .map(|id| comment(id, (id > 1).then(|| id - 1), at(id as i64)))
        .collect();
    flat.reverse();

    let tree = build_comment_tree(flat);
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].total_count(), depth as usize);

    let mut node = &tree[0];
    while let Some(next) = node.replies.first() {
        node = next;
    }
    assert_eq!(node.depth as u128, depth - 1);
    assert!(!node.can_reply());
}

#[test]
fn two_comment_cycle_never_appears() {
    let tree = build_comment_tree(vec![
        comment(1, Some(2), at(1)),
        comment(2, Some(1), at(2)),
        comment(3, None, at(3)),
    ]);
    assert_eq!(shape(&tree), vec![(3, vec![])]);
}

#[test]
fn every_node_is_reachable_exactly_once() {
    // Deterministic pseudo-random forests, including dangling parents.
    let mut seed: u64 = 0x5eed;
    let mut next = move || {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        seed >> 33
    };

    for round in 0..50 {
        let size = 1 + (next() % 40) as u128;
        let flat: Vec<EnrichedComment> = (1..=size)
            .map(|id| {
                let parent = match next() % 4 {
                    0 => None,
                    1 => Some(size + 1 + next() as u128 % 5),
                    _ => Some(1 + next() as u128 % size),
                };
                comment(id, parent, at((next() % 500) as i64))
            })
            .collect();

        let tree = build_comment_tree(flat.clone());
        let ids = all_ids(&tree);
        let unique: HashSet<Uuid> = ids.iter().copied().collect();
        assert_eq!(ids.len(), unique.len(), "duplicate node in round {}", round);

        // Whatever is present must be a root or hang off a present parent.
        for id in &ids {
            let source = flat.iter().find(|c| c.id() == *id).unwrap();
            if let Some(parent) = source.comment.parent_comment_id {
                assert!(unique.contains(&parent), "orphan surfaced in round {}", round);
            }
        }

        // Roots are newest first.
        assert!(
            tree.windows(2)
                .all(|pair| pair[0].comment.comment.created_at >= pair[1].comment.comment.created_at)
        );
    }
}
