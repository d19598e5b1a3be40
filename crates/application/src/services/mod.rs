mod post_service;
mod user_service;


pub use post_service::{PostService, PostServiceDependencies, POSTS_PER_PAGE};
pub use user_service::{SignUpRequest, UserService, UserServiceDependencies};
