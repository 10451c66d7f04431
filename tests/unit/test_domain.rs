use comments::domain::{
    comments::{
        errors::CommentError,
        value_objects::{CommentContent, PostSlug},
    },
    user::{UserMetadata, UserProfile, display_name},
};
use uuid::Uuid;

#[test]
fn post_slug_accepts_content_paths() {
    assert!(PostSlug::new("hello-world").is_ok());
    assert!(PostSlug::new("2024/rust-notes.v2").is_ok());
}

#[test]
fn post_slug_rejects_empty_or_odd_characters() {
    assert!(PostSlug::new("").is_err());
    assert!(PostSlug::new("-leading-dash").is_err());
    assert!(PostSlug::new("has space").is_err());
    assert!(PostSlug::new("a".repeat(201)).is_err());
}

#[test]
fn comment_content_rejects_blank_text() {
    for blank in ["", "   ", "\n\t "] {
        assert_eq!(
            CommentContent::new(blank, 100),
            Err(CommentError::Validation("Comment cannot be empty".to_string()))
        );
    }
}

#[test]
fn comment_content_is_kept_verbatim() {
    let content = CommentContent::new("  padded reply \n", 100).unwrap();
    assert_eq!(content.as_str(), "  padded reply \n");
}

#[test]
fn comment_content_enforces_length_in_characters() {
    assert!(CommentContent::new("é".repeat(10), 10).is_ok());
    assert!(CommentContent::new("é".repeat(11), 10).is_err());
}

#[test]
fn auth_required_message_names_the_action() {
    let err = CommentError::AuthRequired {
        action: "edit comments",
    };
    assert_eq!(err.to_string(), "You must be logged in to edit comments");
}

#[test]
fn empty_remote_message_falls_back() {
    let err = CommentError::Mutation(String::new());
    assert_eq!(err.message_or("Failed to add comment"), "Failed to add comment");
    let err = CommentError::Mutation("permission denied".to_string());
    assert_eq!(err.message_or("Failed to add comment"), "permission denied");
}

#[test]
fn author_display_name_follows_fallback_chain() {
    let mut author = UserProfile {
        id: Uuid::now_v7(),
        email: Some("linus@example.org".to_string()),
        user_metadata: UserMetadata {
            name: Some("Linus".to_string()),
            avatar_url: None,
        },
    };
    assert_eq!(display_name(Some(&author)), "Linus");

    author.user_metadata.name = None;
    assert_eq!(display_name(Some(&author)), "linus");

    author.email = None;
    assert_eq!(display_name(Some(&author)), "Anonymous");
}

#[test]
fn user_profile_tolerates_sparse_auth_payloads() {
    let json = r#"{"id":"0190d6c2-5f0e-7c3a-8f21-3b4f5a6b7c8d","aud":"authenticated"}"#;
    let profile: UserProfile = serde_json::from_str(json).unwrap();
    assert_eq!(profile.email, None);
    assert_eq!(profile.user_metadata, UserMetadata::default());
}
