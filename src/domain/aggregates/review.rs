//! Product reviews and replies

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Review {
    pub id: Uuid,
    pub product_id: Uuid,
    pub customer_name: String,
    pub rating: i32,
    pub comment: String,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReviewReply {
    pub id: Uuid,
    pub review_id: Uuid,
    pub author_name: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewWithReplies {
    #[serde(flatten)]
    pub review: Review,
    pub replies: Vec<ReviewReply>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewSummary {
    pub count: usize,
    pub average_rating: Option<Decimal>,
}

impl ReviewSummary {
    /// Average over the given ratings, rounded to one decimal place.
    pub fn from_ratings(ratings: impl IntoIterator<Item = i32>) -> Self {
        let (count, sum) = ratings.into_iter().fold((0usize, 0i64), |(n, s), r| (n + 1, s + i64::from(r)));
        let average_rating = (count > 0).then(|| (Decimal::from(sum) / Decimal::from(count as i64)).round_dp(1));
        Self { count, average_rating }
    }
}

/// Groups replies under their reviews, keeping review order.
pub fn attach_replies(reviews: Vec<Review>, mut replies: Vec<ReviewReply>) -> Vec<ReviewWithReplies> {
    reviews
        .into_iter()
        .map(|review| {
            let (mine, rest): (Vec<_>, Vec<_>) = replies.drain(..).partition(|r| r.review_id == review.id);
            replies = rest;
            ReviewWithReplies { review, replies: mine }
        })
        .collect()
}
