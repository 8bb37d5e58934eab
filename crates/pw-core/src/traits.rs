//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::mail::Email;
use crate::models::{
    Claims, Comment, FriendRequest, FriendRequestView, Pagination, Payment, PaymentLink,
    PaymentNotification, PaymentOrder, Report, ReportStatus, Repost, Stats, Thread, ThreadView,
    User, UserProfile,
};

/// Account persistence.
#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Fails with `Conflict` when the username or email is taken.
    async fn create_user(&self, user: User) -> Result<()>;
    async fn get_user(&self, id: Uuid) -> Result<Option<User>>;
    /// Looks a user up by username or email, case-insensitively.
    async fn find_user_by_login(&self, login: &str) -> Result<Option<User>>;
    async fn search_users(&self, query: Option<&str>, page: Pagination) -> Result<Vec<User>>;
    async fn update_pro(
        &self,
        id: Uuid,
        is_pro: bool,
        pro_expiry: Option<DateTime<Utc>>,
    ) -> Result<Option<User>>;
    /// Bulk `is_pro AND pro_expiry <= now` -> not Pro. Returns rows touched.
    async fn expire_pro(&self, now: DateTime<Utc>) -> Result<u64>;
}

/// Threads, comments and reposts.
#[async_trait]
pub trait ThreadRepo: Send + Sync {
    async fn create_thread(&self, thread: Thread) -> Result<()>;
    async fn get_thread(&self, id: Uuid) -> Result<Option<ThreadView>>;
    /// Newest first. `query` matches content or author username.
    async fn search_threads(&self, query: Option<&str>, page: Pagination)
        -> Result<Vec<ThreadView>>;
    async fn list_threads_by_hashtag(&self, tag: &str, page: Pagination)
        -> Result<Vec<ThreadView>>;
    /// Removes the thread with its comments and reposts.
    async fn delete_thread(&self, id: Uuid) -> Result<bool>;

    async fn create_comment(&self, comment: Comment) -> Result<()>;
    async fn get_comment(&self, id: Uuid) -> Result<Option<Comment>>;
    async fn list_comments(&self, thread_id: Uuid) -> Result<Vec<Comment>>;

    /// Fails with `Conflict` when the user already reposted the thread.
    async fn create_repost(&self, repost: Repost) -> Result<()>;
    async fn delete_repost(&self, user_id: Uuid, thread_id: Uuid) -> Result<bool>;
}

/// Friend requests and friendships.
#[async_trait]
pub trait SocialRepo: Send + Sync {
    async fn create_friend_request(&self, request: FriendRequest) -> Result<()>;
    async fn get_friend_request(&self, id: Uuid) -> Result<Option<FriendRequest>>;
    /// A PENDING request between the two users, in either direction.
    async fn find_pending_request(&self, a: Uuid, b: Uuid) -> Result<Option<FriendRequest>>;
    async fn list_incoming_requests(&self, user_id: Uuid) -> Result<Vec<FriendRequestView>>;
    /// Marks the request ACCEPTED and befriends both users in one transaction.
    /// Fails with `Conflict` if the request is no longer pending.
    async fn accept_friend_request(&self, id: Uuid, at: DateTime<Utc>) -> Result<FriendRequest>;
    async fn reject_friend_request(&self, id: Uuid, at: DateTime<Utc>) -> Result<FriendRequest>;
    async fn are_friends(&self, a: Uuid, b: Uuid) -> Result<bool>;
    async fn list_friends(&self, user_id: Uuid) -> Result<Vec<UserProfile>>;
    async fn remove_friend(&self, a: Uuid, b: Uuid) -> Result<bool>;
}

/// Moderation reports.
#[async_trait]
pub trait ReportRepo: Send + Sync {
    async fn create_report(&self, report: Report) -> Result<()>;
    async fn get_report(&self, id: Uuid) -> Result<Option<Report>>;
    async fn list_reports(&self, status: Option<ReportStatus>, page: Pagination)
        -> Result<Vec<Report>>;
    /// Sets the status (when given) and appends one history entry in a
    /// single statement. `None` if the report does not exist.
    async fn update_report(
        &self,
        id: Uuid,
        status: Option<ReportStatus>,
        notes: Option<String>,
        actor: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Option<Report>>;
}

/// Pro purchases.
#[async_trait]
pub trait PaymentRepo: Send + Sync {
    async fn create_payment(&self, payment: Payment) -> Result<()>;
    async fn get_payment(&self, order_id: &str) -> Result<Option<Payment>>;
    /// Marks a PENDING payment PAID and extends the buyer's Pro expiry, atomically.
    /// Returns the updated buyer, or `None` if the payment was not pending.
    async fn complete_payment(
        &self,
        order_id: &str,
        trans_id: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<User>>;
    /// Marks a PENDING payment FAILED. Returns whether anything changed.
    async fn fail_payment(&self, order_id: &str, trans_id: i64) -> Result<bool>;
}

/// Admin dashboard aggregates.
#[async_trait]
pub trait StatsRepo: Send + Sync {
    async fn stats(&self) -> Result<Stats>;
}

/// Everything the web layer needs from storage.
pub trait Repository: UserRepo + ThreadRepo + SocialRepo + ReportRepo + PaymentRepo + StatsRepo {}

impl<T> Repository for T where
    T: UserRepo + ThreadRepo + SocialRepo + ReportRepo + PaymentRepo + StatsRepo
{
}

/// Identity contract.
pub trait AuthProvider: Send + Sync {
    /// Produces a salted, self-describing hash string.
    fn hash_password(&self, password: &str) -> Result<String>;

    /// Verifies a password against a stored hash. Malformed hashes never verify.
    fn verify_password(&self, password: &str, hash: &str) -> bool;

    /// Issues a signed session token for the user.
    fn issue_token(&self, user: &User) -> Result<String>;

    /// Checks signature and expiry.
    fn verify_token(&self, token: &str) -> Result<Claims>;
}

/// Outbound email.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: Email) -> Result<()>;
}

/// Payment gateway contract.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Opens a checkout session and returns where to send the buyer.
    async fn create_payment(&self, order: PaymentOrder) -> Result<PaymentLink>;

    /// Checks the notification's signature.
    fn verify_notification(&self, notification: &PaymentNotification) -> bool;
}
