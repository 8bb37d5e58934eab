//! # Domain Models
//!
//! These structs represent the core entities of PawSter.
//! We use UUID v7 for time-ordered, globally unique identification.
//! Wire names are camelCase to match what the web client sends.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub is_admin: bool,
    pub is_pro: bool,
    pub pro_expiry: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// What other users get to see of an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub is_pro: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            display_name: user.display_name.clone(),
            bio: user.bio.clone(),
            is_pro: user.is_pro,
            created_at: user.created_at,
        }
    }
}

/// A user-authored post.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    pub id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    /// Lower-cased tags in order of first appearance
    pub hashtags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// A thread joined with its author and engagement counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadView {
    #[serde(flatten)]
    pub thread: Thread,
    pub author_username: String,
    pub comment_count: i64,
    pub repost_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub thread_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A user re-sharing a thread. One per (user, thread).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repost {
    pub id: Uuid,
    pub user_id: Uuid,
    pub thread_id: Uuid,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Generates `as_str`, `Display` and `FromStr` for the plain string enums
/// we persist as TEXT columns.
macro_rules! string_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = AppError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(AppError::Internal(format!(
                        "unknown {} value {:?}", stringify!($name), other
                    ))),
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FriendRequestStatus {
    Pending,
    Accepted,
    Rejected,
}

string_enum!(FriendRequestStatus {
    Pending => "PENDING",
    Accepted => "ACCEPTED",
    Rejected => "REJECTED",
});

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequest {
    pub id: Uuid,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub status: FriendRequestStatus,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

/// An incoming request together with who sent it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestView {
    #[serde(flatten)]
    pub request: FriendRequest,
    pub from: UserProfile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportTarget {
    Thread,
    Comment,
    User,
}

string_enum!(ReportTarget {
    Thread => "thread",
    Comment => "comment",
    User => "user",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    Open,
    Resolved,
    Rejected,
}

string_enum!(ReportStatus {
    Open => "OPEN",
    Resolved => "RESOLVED",
    Rejected => "REJECTED",
});

/// One line of a report's audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportHistoryEntry {
    pub action: String,
    pub actor: Uuid,
    pub timestamp: DateTime<Utc>,
    pub notes: Option<String>,
}

impl ReportHistoryEntry {
    /// A moderator update: the new status name, or `NOTE` when only notes
    /// were given. Any status may follow any other.
    pub fn update(
        status: Option<ReportStatus>,
        notes: Option<String>,
        actor: Uuid,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            action: status.map_or("NOTE", |s| s.as_str()).to_string(),
            actor,
            timestamp: at,
            notes,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: Uuid,
    pub reporter_id: Uuid,
    pub target_type: ReportTarget,
    pub target_id: Uuid,
    pub reason: String,
    pub details: Option<String>,
    pub status: ReportStatus,
    pub history: Vec<ReportHistoryEntry>,
    pub created_at: DateTime<Utc>,
}

impl Report {
    /// Opens a new report; the history starts with a `CREATED` entry.
    pub fn open(
        reporter_id: Uuid,
        target_type: ReportTarget,
        target_id: Uuid,
        reason: String,
        details: Option<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            reporter_id,
            target_type,
            target_id,
            reason,
            details,
            status: ReportStatus::Open,
            history: vec![ReportHistoryEntry {
                action: "CREATED".to_string(),
                actor: reporter_id,
                timestamp: at,
                notes: None,
            }],
            created_at: at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

string_enum!(PaymentStatus {
    Pending => "PENDING",
    Paid => "PAID",
    Failed => "FAILED",
});

/// A Pro purchase through the payment gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub order_id: String,
    pub request_id: String,
    /// Amount in VND
    pub amount: i64,
    pub plan_months: u32,
    pub status: PaymentStatus,
    pub trans_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

/// Everything the gateway needs to open a checkout session.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentOrder {
    pub order_id: String,
    pub request_id: String,
    pub amount: i64,
    pub order_info: String,
    pub extra_data: String,
}

/// Where to send the buyer to pay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentLink {
    pub pay_url: String,
    pub deeplink: Option<String>,
}

/// Instant payment notification (IPN) body posted by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentNotification {
    pub partner_code: String,
    pub order_id: String,
    pub request_id: String,
    pub amount: i64,
    pub order_info: String,
    pub order_type: String,
    pub trans_id: i64,
    pub result_code: i32,
    pub message: String,
    pub pay_type: String,
    pub response_time: i64,
    pub extra_data: String,
    pub signature: String,
}

/// Counters shown on the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub users: i64,
    pub pro_users: i64,
    pub admins: i64,
    pub threads: i64,
    pub comments: i64,
    pub reposts: i64,
    pub open_reports: i64,
    pub pending_friend_requests: i64,
    pub paid_payments: i64,
    pub revenue: i64,
}

/// Page/limit pair shared by every listing endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Pagination {
    pub const DEFAULT_LIMIT: u32 = 20;
    pub const MAX_LIMIT: u32 = 100;

    /// Pages are 1-based; the limit is clamped to `1..=MAX_LIMIT`.
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT),
        }
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.limit)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// JWT payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub adm: bool,
    pub iat: i64,
    pub exp: i64,
}
