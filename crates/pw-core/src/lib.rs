//! pawster/crates/pw-core/src/lib.rs
//!
//! The central domain logic and interface definitions for PawSter.

pub mod error;
pub mod hashtags;
pub mod mail;
pub mod models;
pub mod pro;
pub mod traits;
pub mod validate;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use traits::*;

#[cfg(test)]
mod tests {
    use super::models::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn report_history_starts_created_and_names_updates() {
        let reporter = Uuid::now_v7();
        let moderator = Uuid::now_v7();
        let mut report = Report::open(
            reporter,
            ReportTarget::Thread,
            Uuid::now_v7(),
            "spam".into(),
            None,
            Utc::now(),
        );
        assert_eq!(report.status, ReportStatus::Open);
        assert_eq!(report.history.len(), 1);
        assert_eq!(report.history[0].action, "CREATED");

        assert_eq!(report.history[0].actor, reporter);

        let resolved = ReportHistoryEntry::update(Some(ReportStatus::Resolved), None, moderator, Utc::now());
        assert_eq!(resolved.action, "RESOLVED");
        let note = ReportHistoryEntry::update(None, Some("looking again".into()), moderator, Utc::now());
        assert_eq!(note.action, "NOTE");
        assert_eq!(note.actor, moderator);
        assert_eq!(note.notes.as_deref(), Some("looking again"));
    }

    #[test]
    fn enums_round_trip_through_their_column_text() {
        assert_eq!("ACCEPTED".parse::<FriendRequestStatus>().unwrap(), FriendRequestStatus::Accepted);
        assert_eq!(ReportTarget::Comment.as_str(), "comment");
        assert!("paid".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn pagination_clamps_input() {
        let page = Pagination::new(Some(0), Some(1_000));
        assert_eq!(page.page, 1);
        assert_eq!(page.limit(), Pagination::MAX_LIMIT as i64);
        assert_eq!(Pagination::new(Some(3), Some(10)).offset(), 20);
    }

    #[test]
    fn user_serialization_hides_password_hash() {
        let user = User {
            id: Uuid::now_v7(),
            username: "rex".into(),
            email: "rex@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            display_name: None,
            bio: None,
            is_admin: false,
            is_pro: true,
            pro_expiry: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["isPro"], true);
    }
}
