//! Admin-area access: who is signed in, and who may open which section.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

use crate::auth::{AdminSection, AdminUser, Role};
use crate::{AppState, Result, StoreError};

#[derive(Debug, Serialize)]
pub struct Me {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub role: Role,
    pub sections: Vec<AdminSection>,
}

/// Open to any caller with a role; the admin UI uses it to build its menu.
pub async fn me(AdminUser(user): AdminUser) -> Json<Me> {
    let sections = user.sections();
    Json(Me { user_id: user.user_id, email: user.email, role: user.role, sections })
}

#[derive(Debug, Serialize)]
pub struct UserAccess {
    pub user_id: Uuid,
    pub role: Role,
    pub sections: Vec<AdminSection>,
    pub created_at: DateTime<Utc>,
}

pub async fn list_users(State(s): State<AppState>, AdminUser(user): AdminUser) -> Result<Json<Vec<UserAccess>>> {
    user.require(AdminSection::Users)?;
    let roles: Vec<(Uuid, String, DateTime<Utc>)> =
        sqlx::query_as("SELECT user_id, role, created_at FROM user_roles ORDER BY created_at")
            .fetch_all(&s.db)
            .await?;
    let grants: Vec<(Uuid, String)> = sqlx::query_as("SELECT user_id, section FROM user_permissions WHERE allowed")
        .fetch_all(&s.db)
        .await?;

    let mut sections: HashMap<Uuid, BTreeSet<AdminSection>> = HashMap::new();
    for (user_id, section) in grants {
        if let Ok(section) = section.parse() {
            sections.entry(user_id).or_default().insert(section);
        }
    }
    let users = roles
        .into_iter()
        .filter_map(|(user_id, role, created_at)| {
            let role = role.parse().ok()?;
            let sections = sections.remove(&user_id).map(|s| s.into_iter().collect()).unwrap_or_default();
            Some(UserAccess { user_id, role, sections, created_at })
        })
        .collect();
    Ok(Json(users))
}

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub role: Role,
}

pub async fn set_role(
    State(s): State<AppState>,
    AdminUser(user): AdminUser,
    Path(user_id): Path<Uuid>,
    Json(r): Json<RoleRequest>,
) -> Result<StatusCode> {
    user.require(AdminSection::Users)?;
    if user_id == user.user_id && r.role != user.role {
        return Err(StoreError::Conflict("cannot change your own role".into()));
    }
    sqlx::query(
        "INSERT INTO user_roles (id, user_id, role, created_at) VALUES ($1, $2, $3, NOW()) \
         ON CONFLICT (user_id) DO UPDATE SET role = EXCLUDED.role",
    )
    .bind(Uuid::now_v7())
    .bind(user_id)
    .bind(r.role.as_str())
    .execute(&s.db)
    .await?;
    tracing::info!(%user_id, role = r.role.as_str(), by = %user.user_id, "role assigned");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct PermissionsRequest {
    pub sections: BTreeSet<AdminSection>,
}

/// Replaces the user's granted sections with exactly the given set.
pub async fn set_permissions(
    State(s): State<AppState>,
    AdminUser(user): AdminUser,
    Path(user_id): Path<Uuid>,
    Json(r): Json<PermissionsRequest>,
) -> Result<Json<Vec<AdminSection>>> {
    user.require(AdminSection::Users)?;
    let mut tx = s.db.begin().await?;
    let has_role: Option<(Uuid,)> = sqlx::query_as("SELECT user_id FROM user_roles WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;
    if has_role.is_none() {
        return Err(StoreError::NotFound("user"));
    }
    sqlx::query("DELETE FROM user_permissions WHERE user_id = $1").bind(user_id).execute(&mut *tx).await?;
    for section in &r.sections {
        sqlx::query(
            "INSERT INTO user_permissions (id, user_id, section, allowed, created_at) VALUES ($1, $2, $3, TRUE, NOW())",
        )
        .bind(Uuid::now_v7())
        .bind(user_id)
        .bind(section.as_str())
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    tracing::info!(%user_id, sections = r.sections.len(), by = %user.user_id, "permissions replaced");
    Ok(Json(r.sections.into_iter().collect()))
}

/// Removes the role and every grant; the user can no longer open the admin area.
pub async fn revoke_access(State(s): State<AppState>, AdminUser(user): AdminUser, Path(user_id): Path<Uuid>) -> Result<StatusCode> {
    user.require(AdminSection::Users)?;
    if user_id == user.user_id {
        return Err(StoreError::Conflict("cannot revoke your own access".into()));
    }
    let mut tx = s.db.begin().await?;
    sqlx::query("DELETE FROM user_permissions WHERE user_id = $1").bind(user_id).execute(&mut *tx).await?;
    let done = sqlx::query("DELETE FROM user_roles WHERE user_id = $1").bind(user_id).execute(&mut *tx).await?;
    if done.rows_affected() == 0 {
        return Err(StoreError::NotFound("user"));
    }
    tx.commit().await?;
    tracing::info!(%user_id, by = %user.user_id, "admin access revoked");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permissions_body_dedupes_and_rejects_unknown_sections() {
        let r: PermissionsRequest = serde_json::from_str(r#"{"sections":["orders","coupons","orders"]}"#).unwrap();
        assert_eq!(r.sections.len(), 2);
        assert!(serde_json::from_str::<PermissionsRequest>(r#"{"sections":["billing"]}"#).is_err());
    }

    #[test]
    fn role_body() {
        let r: RoleRequest = serde_json::from_str(r#"{"role":"user"}"#).unwrap();
        assert_eq!(r.role, Role::User);
    }
}
