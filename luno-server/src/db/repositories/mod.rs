mod user_repository;
mod relation_repository;
mod post_repository;
mod like_repository;
mod comment_repository;
mod message_repository;

pub use user_repository::UserRepository;
pub use relation_repository::RelationRepository;
pub use post_repository::PostRepository;
pub use like_repository::LikeRepository;
pub use comment_repository::CommentRepository;
pub use message_repository::MessageRepository;
