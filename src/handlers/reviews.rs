//! Product reviews: public submission and listing, admin moderation.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth::{AdminSection, AdminUser};
use crate::domain::aggregates::review::{attach_replies, ReviewWithReplies};
use crate::domain::aggregates::{Review, ReviewReply, ReviewSummary};
use crate::domain::events::DomainEvent;
use crate::domain::value_objects::validate_customer_name;
use crate::{AppState, Result, StoreError};

#[derive(Debug, Serialize)]
pub struct ProductReviews {
    pub summary: ReviewSummary,
    pub reviews: Vec<ReviewWithReplies>,
}

async fn replies_for(s: &AppState, reviews: &[Review]) -> Result<Vec<ReviewReply>> {
    let ids: Vec<Uuid> = reviews.iter().map(|r| r.id).collect();
    let replies = sqlx::query_as::<_, ReviewReply>("SELECT * FROM review_replies WHERE review_id = ANY($1) ORDER BY created_at")
        .bind(&ids)
        .fetch_all(&s.db)
        .await?;
    Ok(replies)
}

pub async fn list_product_reviews(State(s): State<AppState>, Path(product_id): Path<Uuid>) -> Result<Json<ProductReviews>> {
    let reviews = sqlx::query_as::<_, Review>(
        "SELECT * FROM reviews WHERE product_id = $1 AND is_approved ORDER BY created_at DESC",
    )
    .bind(product_id)
    .fetch_all(&s.db)
    .await?;
    let summary = ReviewSummary::from_ratings(reviews.iter().map(|r| r.rating));
    let replies = replies_for(&s, &reviews).await?;
    Ok(Json(ProductReviews { summary, reviews: attach_replies(reviews, replies) }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReviewRequest {
    #[validate(custom = "validate_customer_name")]
    pub customer_name: String,
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,
    #[validate(length(min = 1, max = 1000))]
    pub comment: String,
}

/// Reviews are held for moderation and only listed once approved.
pub async fn submit_review(
    State(s): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(r): Json<ReviewRequest>,
) -> Result<(StatusCode, Json<Review>)> {
    r.validate()?;
    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1 AND is_active")
        .bind(product_id)
        .fetch_optional(&s.db)
        .await?;
    if exists.is_none() {
        return Err(StoreError::NotFound("product"));
    }
    let review = sqlx::query_as::<_, Review>(
        "INSERT INTO reviews (id, product_id, customer_name, rating, comment, is_approved, created_at) \
         VALUES ($1, $2, $3, $4, $5, FALSE, NOW()) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(product_id)
    .bind(r.customer_name.trim())
    .bind(r.rating)
    .bind(r.comment.trim())
    .fetch_one(&s.db)
    .await?;
    tracing::info!(review_id = %review.id, %product_id, rating = review.rating, "review submitted");
    s.events
        .publish(DomainEvent::ReviewSubmitted { review_id: review.id, product_id, rating: review.rating })
        .await;
    Ok((StatusCode::CREATED, Json(review)))
}

// =============================================================================
// Admin
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ReviewFilter {
    pub approved: Option<bool>,
    pub product_id: Option<Uuid>,
}

pub async fn admin_list_reviews(
    State(s): State<AppState>,
    AdminUser(user): AdminUser,
    Query(filter): Query<ReviewFilter>,
) -> Result<Json<Vec<ReviewWithReplies>>> {
    user.require(AdminSection::Reviews)?;
    let reviews = sqlx::query_as::<_, Review>(
        "SELECT * FROM reviews WHERE ($1::bool IS NULL OR is_approved = $1) AND ($2::uuid IS NULL OR product_id = $2) \
         ORDER BY created_at DESC",
    )
    .bind(filter.approved)
    .bind(filter.product_id)
    .fetch_all(&s.db)
    .await?;
    let replies = replies_for(&s, &reviews).await?;
    Ok(Json(attach_replies(reviews, replies)))
}

#[derive(Debug, Deserialize)]
pub struct ApprovalRequest {
    pub is_approved: bool,
}

pub async fn set_approval(
    State(s): State<AppState>,
    AdminUser(user): AdminUser,
    Path(id): Path<Uuid>,
    Json(r): Json<ApprovalRequest>,
) -> Result<Json<Review>> {
    user.require(AdminSection::Reviews)?;
    sqlx::query_as::<_, Review>("UPDATE reviews SET is_approved = $2 WHERE id = $1 RETURNING *")
        .bind(id)
        .bind(r.is_approved)
        .fetch_optional(&s.db)
        .await?
        .map(Json)
        .ok_or(StoreError::NotFound("review"))
}

pub async fn delete_review(State(s): State<AppState>, AdminUser(user): AdminUser, Path(id): Path<Uuid>) -> Result<StatusCode> {
    user.require(AdminSection::Reviews)?;
    let done = sqlx::query("DELETE FROM reviews WHERE id = $1").bind(id).execute(&s.db).await?;
    if done.rows_affected() == 0 {
        return Err(StoreError::NotFound("review"));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReplyRequest {
    #[validate(length(min = 1, max = 100))]
    pub author_name: String,
    #[validate(length(min = 1, max = 1000))]
    pub body: String,
}

pub async fn add_reply(
    State(s): State<AppState>,
    AdminUser(user): AdminUser,
    Path(review_id): Path<Uuid>,
    Json(r): Json<ReplyRequest>,
) -> Result<(StatusCode, Json<ReviewReply>)> {
    user.require(AdminSection::Reviews)?;
    r.validate()?;
    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM reviews WHERE id = $1")
        .bind(review_id)
        .fetch_optional(&s.db)
        .await?;
    if exists.is_none() {
        return Err(StoreError::NotFound("review"));
    }
    let reply = sqlx::query_as::<_, ReviewReply>(
        "INSERT INTO review_replies (id, review_id, author_name, body, created_at) VALUES ($1, $2, $3, $4, NOW()) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(review_id)
    .bind(r.author_name.trim())
    .bind(r.body.trim())
    .fetch_one(&s.db)
    .await?;
    Ok((StatusCode::CREATED, Json(reply)))
}

pub async fn delete_reply(
    State(s): State<AppState>,
    AdminUser(user): AdminUser,
    Path((review_id, reply_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode> {
    user.require(AdminSection::Reviews)?;
    let done = sqlx::query("DELETE FROM review_replies WHERE id = $1 AND review_id = $2")
        .bind(reply_id)
        .bind(review_id)
        .execute(&s.db)
        .await?;
    if done.rows_affected() == 0 {
        return Err(StoreError::NotFound("reply"));
    }
    Ok(StatusCode::NO_CONTENT)
}
