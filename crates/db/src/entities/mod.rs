//! Database entities.

#![allow(missing_docs)]

pub mod announcement;
pub mod category_request;
pub mod comment;
pub mod fan_group;
pub mod group_moderator;
pub mod manager_application;
pub mod message;
pub mod notification;
pub mod post;
pub mod post_like;
pub mod profile;
pub mod purchase;
pub mod report;

pub use announcement::Entity as Announcement;
pub use category_request::Entity as CategoryRequest;
pub use comment::Entity as Comment;
pub use fan_group::Entity as FanGroup;
pub use group_moderator::Entity as GroupModerator;
pub use manager_application::Entity as ManagerApplication;
pub use message::Entity as Message;
pub use notification::Entity as Notification;
pub use post::Entity as Post;
pub use post_like::Entity as PostLike;
pub use profile::Entity as Profile;
pub use purchase::Entity as Purchase;
pub use report::Entity as Report;
