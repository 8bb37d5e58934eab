use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pw_core::error::{AppError, Result};
use pw_core::models::{Pagination, Report, ReportHistoryEntry, ReportStatus};
use pw_core::traits::ReportRepo;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use crate::{enum_column, json_column, DbResultExt, SqliteRepo};

const REPORT_COLUMNS: &str =
    "id, reporter_id, target_type, target_id, reason, details, status, history, created_at";

fn report_from_row(row: &SqliteRow) -> std::result::Result<Report, sqlx::Error> {
    Ok(Report {
        id: row.try_get("id")?,
        reporter_id: row.try_get("reporter_id")?,
        target_type: enum_column(row, "target_type")?,
        target_id: row.try_get("target_id")?,
        reason: row.try_get("reason")?,
        details: row.try_get("details")?,
        status: enum_column(row, "status")?,
        history: json_column(row, "history")?,
        created_at: row.try_get("created_at")?,
    })
}

fn history_json(report: &Report) -> Result<String> {
    serde_json::to_string(&report.history).map_err(|e| AppError::Internal(e.to_string()))
}

#[async_trait]
impl ReportRepo for SqliteRepo {
    async fn create_report(&self, report: Report) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO reports ({REPORT_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(report.id)
        .bind(report.reporter_id)
        .bind(report.target_type.as_str())
        .bind(report.target_id)
        .bind(&report.reason)
        .bind(&report.details)
        .bind(report.status.as_str())
        .bind(history_json(&report)?)
        .bind(report.created_at)
        .execute(&self.pool)
        .await
        .db()?;
        Ok(())
    }

    async fn get_report(&self, id: Uuid) -> Result<Option<Report>> {
        sqlx::query(&format!("SELECT {REPORT_COLUMNS} FROM reports WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .db()?
            .map(|row| report_from_row(&row))
            .transpose()
            .db()
    }

    async fn list_reports(
        &self,
        status: Option<ReportStatus>,
        page: Pagination,
    ) -> Result<Vec<Report>> {
        let rows = sqlx::query(&format!(
            "SELECT {REPORT_COLUMNS} FROM reports \
             WHERE ?1 IS NULL OR status = ?1 \
             ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3"
        ))
        .bind(status.map(|s| s.as_str()))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .db()?;

        rows.iter()
            .map(report_from_row)
            .collect::<std::result::Result<_, _>>()
            .db()
    }

    async fn update_report(
        &self,
        id: Uuid,
        status: Option<ReportStatus>,
        notes: Option<String>,
        actor: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Option<Report>> {
        let entry = ReportHistoryEntry::update(status, notes, actor, at);
        let entry = serde_json::to_string(&entry).map_err(|e| AppError::Internal(e.to_string()))?;

        // Appending in SQL keeps concurrent updates from overwriting each other
        sqlx::query(&format!(
            "UPDATE reports \
             SET status = COALESCE(?1, status), history = json_insert(history, '$[#]', json(?2)) \
             WHERE id = ?3 RETURNING {REPORT_COLUMNS}"
        ))
        .bind(status.map(|s| s.as_str()))
        .bind(entry)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .db()?
        .map(|row| report_from_row(&row))
        .transpose()
        .db()
    }
}

#[cfg(test)]
mod tests {
    use pw_core::models::ReportTarget;

    use super::*;
    use crate::testing::{repo, user};

    #[tokio::test]
    async fn update_appends_history_and_sets_status() {
        let repo = repo().await;
        let rex = user(&repo, "rex").await;
        let admin = user(&repo, "admin").await;

        let report = Report::open(
            rex.id,
            ReportTarget::User,
            admin.id,
            "rude".into(),
            Some("barked at me".into()),
            Utc::now(),
        );
        repo.create_report(report.clone()).await.unwrap();

        let updated = repo
            .update_report(report.id, Some(ReportStatus::Rejected), Some("no".into()), admin.id, Utc::now())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, ReportStatus::Rejected);
        assert_eq!(updated.history.len(), 2);
        assert_eq!(updated.history[1].notes.as_deref(), Some("no"));

        // A note alone keeps the status
        repo.update_report(report.id, None, Some("appeal denied".into()), admin.id, Utc::now())
            .await
            .unwrap();
        let stored = repo.get_report(report.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ReportStatus::Rejected);
        assert_eq!(stored.history[0], report.history[0]);
        assert_eq!(stored.history[2].action, "NOTE");
        assert_eq!(stored.target_type, ReportTarget::User);

        let missing = repo
            .update_report(Uuid::now_v7(), None, Some("x".into()), admin.id, Utc::now())
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn overlapping_updates_both_land_in_history() {
        let repo = repo().await;
        let rex = user(&repo, "rex").await;
        let admin = user(&repo, "admin").await;
        let report = Report::open(rex.id, ReportTarget::User, admin.id, "rude".into(), None, Utc::now());
        repo.create_report(report.clone()).await.unwrap();

        // Both moderators act on the same report they loaded earlier
        let seen_by_first = repo.get_report(report.id).await.unwrap().unwrap();
        let seen_by_second = repo.get_report(report.id).await.unwrap().unwrap();
        let (resolved, noted) = tokio::join!(
            repo.update_report(seen_by_first.id, Some(ReportStatus::Resolved), None, admin.id, Utc::now()),
            repo.update_report(seen_by_second.id, None, Some("dup".into()), admin.id, Utc::now()),
        );
        resolved.unwrap().unwrap();
        noted.unwrap().unwrap();

        let stored = repo.get_report(report.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ReportStatus::Resolved);
        let mut actions: Vec<_> = stored.history.iter().map(|h| h.action.as_str()).collect();
        actions.sort_unstable();
        assert_eq!(actions, vec!["CREATED", "NOTE", "RESOLVED"]);
    }

    #[tokio::test]
    async fn listing_filters_by_status() {
        let repo = repo().await;
        let rex = user(&repo, "rex").await;

        for reason in ["a", "b", "c"] {
            let report = Report::open(
                rex.id,
                ReportTarget::Thread,
                Uuid::now_v7(),
                reason.into(),
                None,
                Utc::now(),
            );
            repo.create_report(report).await.unwrap();
        }
        let first = repo
            .list_reports(None, Pagination::default())
            .await
            .unwrap()
            .remove(0);
        repo.update_report(first.id, Some(ReportStatus::Resolved), None, rex.id, Utc::now())
            .await
            .unwrap();

        let open = repo
            .list_reports(Some(ReportStatus::Open), Pagination::default())
            .await
            .unwrap();
        assert_eq!(open.len(), 2);
        let all = repo.list_reports(None, Pagination::default()).await.unwrap();
        assert_eq!(all.len(), 3);
    }
}
