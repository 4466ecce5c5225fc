//! Database repositories.

mod announcement;
mod category_request;
mod comment;
mod fan_group;
mod manager_application;
mod message;
mod moderator;
mod notification;
mod post;
mod post_like;
mod profile;
mod purchase;
mod report;

pub use announcement::AnnouncementRepository;
pub use category_request::CategoryRequestRepository;
pub use comment::CommentRepository;
pub use fan_group::FanGroupRepository;
pub use manager_application::ManagerApplicationRepository;
pub use message::MessageRepository;
pub use moderator::ModeratorRepository;
pub use notification::NotificationRepository;
pub use post::PostRepository;
pub use post_like::PostLikeRepository;
pub use profile::ProfileRepository;
pub use purchase::PurchaseRepository;
pub use report::ReportRepository;
