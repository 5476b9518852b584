use std::collections::HashMap;

use uuid::Uuid;

use super::require_user;
use crate::auth::AuthUser;
use crate::models::{ProfileSummary, Review, ReviewInput, ReviewSummary, ReviewWithAuthor};
use crate::state::AppState;
use crate::utils::error::AppError;

/// Arithmetic mean of the overall ratings; 0 when there are none.
pub fn average_rating(reviews: &[Review]) -> f64 {
    if reviews.is_empty() {
        return 0.0;
    }
    let sum: f64 = reviews.iter().map(|r| f64::from(r.rating)).sum();
    sum / reviews.len() as f64
}

pub async fn event_reviews(state: &AppState, event_id: Uuid) -> Result<ReviewSummary, AppError> {
    let reviews = state.store.reviews_for_event(event_id).await?;
    let average = average_rating(&reviews);

    let user_ids: Vec<Uuid> = reviews.iter().map(|r| r.user_id).collect();
    let authors: HashMap<_, _> = state
        .store
        .get_profiles(&user_ids)
        .await?
        .iter()
        .map(|p| (p.id, ProfileSummary::from(p)))
        .collect();

    let count = reviews.len();
    let reviews = reviews
        .into_iter()
        .map(|review| ReviewWithAuthor {
            user: authors.get(&review.user_id).cloned(),
            review,
        })
        .collect();

    Ok(ReviewSummary {
        reviews,
        average_rating: average,
        count,
    })
}

/// Creates the caller's review of an event, or overwrites the one they left.
pub async fn submit_review(
    state: &AppState,
    user: Option<&AuthUser>,
    event_id: Uuid,
    input: ReviewInput,
) -> Result<Review, AppError> {
    let user = require_user(user, "leave a review")?;
    input.validate()?;

    if state.store.get_event(event_id).await?.is_none() {
        return Err(AppError::NotFound("Event not found".to_string()));
    }

    let input = ReviewInput {
        comment: input.comment.filter(|c| !c.trim().is_empty()),
        ..input
    };

    match state.store.find_review(event_id, user.id).await? {
        Some(existing) => {
            state.store.update_review(existing.id, &input).await?;
            tracing::info!(%event_id, user_id = %user.id, "Review updated");
            state
                .store
                .find_review(event_id, user.id)
                .await?
                .ok_or_else(|| AppError::InternalServerError("review vanished after update".to_string()))
        }
        None => {
            let review = state.store.insert_review(event_id, user.id, &input).await?;
            tracing::info!(%event_id, user_id = %user.id, "Review created");
            Ok(review)
        }
    }
}
