//! Business logic services.

#![allow(missing_docs)]

pub mod admin;
pub mod announcement;
pub mod application;
pub mod auth;
pub mod category_request;
pub mod comment;
pub mod group;
pub mod like;
pub mod llm;
pub mod messaging;
pub mod news;
pub mod notification;
pub mod pagination;
pub mod permission;
pub mod points;
pub mod post;
pub mod profile;
pub mod report;
pub mod route_cache;
pub mod shop;

#[cfg(test)]
mod test_fixtures;

pub use admin::{AdjustPointsInput, AdminService, AdminStats};
pub use announcement::{AnnouncementService, CreateAnnouncementInput};
pub use application::{ApplicationService, ApplyInput};
pub use auth::{AuthService, Session, SigninInput, SignupInput};
pub use category_request::{CategoryRequestService, SubmitCategoryInput};
pub use comment::{CommentService, CommentView, CreateCommentInput};
pub use group::{CreateGroupInput, GroupDetail, GroupService, UpdateGroupInput};
pub use like::{LikeService, LikeState};
pub use llm::{LlmClient, OpenAiClient};
pub use messaging::{Inbox, MessageView, MessagingService, SendMessageInput};
pub use news::{NewsOutcome, NewsService};
pub use notification::{NewNotification, NotificationService};
pub use pagination::Pagination;
pub use permission::{Authority, PermissionService, require_admin};
pub use points::PointsService;
pub use post::{CreatePostInput, PostPage, PostService, PostSummary, UpdatePostInput};
pub use profile::{ProfileService, ProfileSummary, PublicProfile, UpdateProfileInput};
pub use report::{CreateReportInput, DismissReportInput, ReportService, ResolveReportInput};
pub use route_cache::RouteCache;
pub use shop::{CosmeticSlot, ShopItem, ShopPage, ShopService};
