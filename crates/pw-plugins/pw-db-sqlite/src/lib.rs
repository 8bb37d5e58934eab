//! # pw-db-sqlite Implementation
//!
//! This crate implements the data mapping between the SQLite relational model
//! and the `pw-core` domain models. Ids are stored as 16-byte BLOBs, timestamps
//! as RFC 3339 TEXT, and list-shaped fields (hashtags, report history) as JSON.

mod payments;
mod reports;
mod social;
mod stats;
mod threads;
mod users;

use std::str::FromStr;
use std::time::Duration;

use pw_core::error::{AppError, Result};
use pw_core::models::{User, UserProfile};
use serde::de::DeserializeOwned;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;

pub struct SqliteRepo {
    pool: SqlitePool,
}

impl SqliteRepo {
    /// Connects and brings the schema up to date.
    ///
    /// # Developer Note
    /// `sqlite::memory:` databases live only as long as their connection, so
    /// for those the pool is pinned to one connection that never expires.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool_options = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(8)
        };

        let pool = pool_options.connect_with(options).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        log::info!("sqlite database ready at {database_url}");
        Ok(Self { pool })
    }
}

/// Logs and hides driver errors behind `AppError::Internal`.
pub(crate) fn db_err(err: sqlx::Error) -> AppError {
    log::error!("database error: {err}");
    AppError::Internal("database error".into())
}

/// Like `db_err`, but a unique-constraint violation becomes `Conflict(msg)`.
pub(crate) fn unique_or_db_err(err: sqlx::Error, msg: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Conflict(msg.into()),
        _ => db_err(err),
    }
}

pub(crate) trait DbResultExt<T> {
    fn db(self) -> Result<T>;
}

impl<T> DbResultExt<T> for std::result::Result<T, sqlx::Error> {
    fn db(self) -> Result<T> {
        self.map_err(db_err)
    }
}

pub(crate) fn decode_err<E>(err: E) -> sqlx::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    sqlx::Error::Decode(Box::new(err))
}

/// Reads a TEXT column holding JSON.
pub(crate) fn json_column<T: DeserializeOwned>(
    row: &SqliteRow,
    column: &str,
) -> std::result::Result<T, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    serde_json::from_str(&raw).map_err(decode_err)
}

/// Reads a TEXT column holding one of our string enums.
pub(crate) fn enum_column<T>(row: &SqliteRow, column: &str) -> std::result::Result<T, sqlx::Error>
where
    T: FromStr<Err = AppError>,
{
    let raw: String = row.try_get(column)?;
    raw.parse().map_err(decode_err)
}

/// `%q%` with LIKE wildcards in `q` escaped (use with `ESCAPE '\'`).
pub(crate) fn like_pattern(q: &str) -> String {
    let escaped = q
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

pub(crate) const USER_COLUMNS: &str =
    "id, username, email, password_hash, display_name, bio, is_admin, is_pro, pro_expiry, created_at";

pub(crate) fn user_from_row(row: &SqliteRow) -> std::result::Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        display_name: row.try_get("display_name")?,
        bio: row.try_get("bio")?,
        is_admin: row.try_get("is_admin")?,
        is_pro: row.try_get("is_pro")?,
        pro_expiry: row.try_get("pro_expiry")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Maps user columns selected with a name prefix (e.g. `u_username`).
pub(crate) fn profile_from_row(
    row: &SqliteRow,
    prefix: &str,
) -> std::result::Result<UserProfile, sqlx::Error> {
    Ok(UserProfile {
        id: row.try_get(format!("{prefix}id").as_str())?,
        username: row.try_get(format!("{prefix}username").as_str())?,
        display_name: row.try_get(format!("{prefix}display_name").as_str())?,
        bio: row.try_get(format!("{prefix}bio").as_str())?,
        is_pro: row.try_get(format!("{prefix}is_pro").as_str())?,
        created_at: row.try_get(format!("{prefix}created_at").as_str())?,
    })
}
