use chrono::{DateTime, Utc};
use log::trace;
use sqlx::{FromRow, SqliteConnection};

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{AccountId, CanteenId, NewProfile, Profile, ProfileRole},
};

const PROFILE_COLUMNS: &str = "id, role, display_name, notification_target, created_at, updated_at";

#[derive(Debug, FromRow)]
struct ProfileRow {
    id: String,
    role: String,
    display_name: Option<String>,
    notification_target: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = SqliteDatabaseError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let role = match row.role.as_str() {
            "owner" => ProfileRole::Owner,
            "user" => ProfileRole::User,
            "admin" => ProfileRole::Admin,
            r => return Err(SqliteDatabaseError::CorruptRecord(format!("Unknown profile role: {r}"))),
        };
        Ok(Profile {
            id: row.id.into(),
            role,
            display_name: row.display_name,
            notification_target: row.notification_target.map(Into::into),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Inserts the profile if it does not exist yet. Returns true if a row was written.
pub async fn insert_profile_if_new(profile: &NewProfile, conn: &mut SqliteConnection) -> Result<bool, SqliteDatabaseError> {
    let now = Utc::now();
    let result = sqlx::query(
        r#"
            INSERT INTO profiles (id, role, display_name, notification_target, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            ON CONFLICT (role, id) DO NOTHING;
        "#,
    )
    .bind(profile.id.as_str())
    .bind(profile.role.to_string())
    .bind(profile.display_name.as_deref())
    .bind(profile.notification_target.as_ref().map(|t| t.as_str()))
    .bind(now)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn update_profile(profile: &NewProfile, conn: &mut SqliteConnection) -> Result<Profile, SqliteDatabaseError> {
    let sql = format!(
        "UPDATE profiles SET display_name = $1, notification_target = $2, updated_at = $3 WHERE role = $4 AND id = $5 \
         RETURNING {PROFILE_COLUMNS}"
    );
    let row = sqlx::query_as::<_, ProfileRow>(&sql)
        .bind(profile.display_name.as_deref())
        .bind(profile.notification_target.as_ref().map(|t| t.as_str()))
        .bind(Utc::now())
        .bind(profile.role.to_string())
        .bind(profile.id.as_str())
        .fetch_one(conn)
        .await?;
    trace!("🧑️ Profile {}/{} updated", profile.role, profile.id);
    Profile::try_from(row)
}

pub async fn fetch_profile(
    role: ProfileRole,
    id: &AccountId,
    conn: &mut SqliteConnection,
) -> Result<Option<Profile>, SqliteDatabaseError> {
    let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE role = $1 AND id = $2");
    let row = sqlx::query_as::<_, ProfileRow>(&sql).bind(role.to_string()).bind(id.as_str()).fetch_optional(conn).await?;
    row.map(Profile::try_from).transpose()
}

pub async fn owner_for_canteen(
    canteen_id: &CanteenId,
    conn: &mut SqliteConnection,
) -> Result<Option<Profile>, SqliteDatabaseError> {
    let sql = format!(
        r#"
            SELECT {PROFILE_COLUMNS} FROM profiles
            WHERE role = 'owner'
              AND id = COALESCE((SELECT owner_id FROM canteen_owners WHERE canteen_id = $1), $1);
        "#
    );
    let row = sqlx::query_as::<_, ProfileRow>(&sql).bind(canteen_id.as_str()).fetch_optional(conn).await?;
    row.map(Profile::try_from).transpose()
}

pub async fn link_canteen_owner(
    canteen_id: &CanteenId,
    owner_id: &AccountId,
    conn: &mut SqliteConnection,
) -> Result<(), SqliteDatabaseError> {
    sqlx::query(
        r#"
            INSERT INTO canteen_owners (canteen_id, owner_id, created_at) VALUES ($1, $2, $3)
            ON CONFLICT (canteen_id) DO UPDATE SET owner_id = excluded.owner_id;
        "#,
    )
    .bind(canteen_id.as_str())
    .bind(owner_id.as_str())
    .bind(Utc::now())
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn fetch_profiles_with_role(
    role: ProfileRole,
    conn: &mut SqliteConnection,
) -> Result<Vec<Profile>, SqliteDatabaseError> {
    let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE role = $1 ORDER BY created_at ASC, id ASC");
    let rows = sqlx::query_as::<_, ProfileRow>(&sql).bind(role.to_string()).fetch_all(conn).await?;
    rows.into_iter().map(Profile::try_from).collect()
}

/// Deletes the profile and returns what it looked like, if it existed.
pub async fn delete_profile(
    role: ProfileRole,
    id: &AccountId,
    conn: &mut SqliteConnection,
) -> Result<Option<Profile>, SqliteDatabaseError> {
    let sql = format!("DELETE FROM profiles WHERE role = $1 AND id = $2 RETURNING {PROFILE_COLUMNS}");
    let row = sqlx::query_as::<_, ProfileRow>(&sql).bind(role.to_string()).bind(id.as_str()).fetch_optional(conn).await?;
    row.map(Profile::try_from).transpose()
}
