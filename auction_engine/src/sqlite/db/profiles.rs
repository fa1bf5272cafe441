use sqlx::{types::Json, SqliteConnection};

use crate::db_types::{CandidateProfile, NewCandidateProfile};

pub async fn insert_profile(
    profile: NewCandidateProfile,
    conn: &mut SqliteConnection,
) -> Result<CandidateProfile, sqlx::Error> {
    let profile =
        sqlx::query_as("INSERT INTO candidate_profiles (candidate_id, account_id, skills) VALUES ($1, $2, $3) RETURNING *")
            .bind(profile.candidate_id)
            .bind(profile.account_id.as_str())
            .bind(Json(profile.skills))
            .fetch_one(conn)
            .await?;
    Ok(profile)
}

/// A page of candidate profiles in id order.
pub async fn fetch_profiles(
    offset: i64,
    limit: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<CandidateProfile>, sqlx::Error> {
    let profiles = sqlx::query_as("SELECT * FROM candidate_profiles ORDER BY id ASC LIMIT $1 OFFSET $2")
        .bind(limit)
        .bind(offset)
        .fetch_all(conn)
        .await?;
    Ok(profiles)
}
