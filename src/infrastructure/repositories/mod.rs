pub mod remote_comment_repository;
