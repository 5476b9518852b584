use crate::auth::AuthUser;
use crate::models::{DanceStyle, Profile, ProfileUpdate, Tag};
use crate::state::AppState;
use crate::utils::error::AppError;

fn not_found() -> AppError {
    AppError::NotFound("Profile not found".to_string())
}

pub async fn get_profile(state: &AppState, user: &AuthUser) -> Result<Profile, AppError> {
    state.store.get_profile(user.id).await?.ok_or_else(not_found)
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    update: ProfileUpdate,
) -> Result<Profile, AppError> {
    update.validate()?;
    let update = update.normalized();

    let profile = state
        .store
        .update_profile(user.id, &update)
        .await?
        .ok_or_else(not_found)?;
    tracing::info!(user_id = %user.id, "Profile updated");
    Ok(profile)
}

pub async fn dance_styles(state: &AppState) -> Result<Vec<DanceStyle>, AppError> {
    Ok(state.store.list_dance_styles().await?)
}

pub async fn tags(state: &AppState) -> Result<Vec<Tag>, AppError> {
    Ok(state.store.list_tags().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::harness;

    #[tokio::test]
    async fn test_update_stores_blank_optionals_as_none() {
        let h = harness();
        let user = h.user("kai@example.com", false, false).await;
        let style = h.store.add_dance_style("Breaking").unwrap();

        let profile = update_profile(
            &h.state,
            &user,
            ProfileUpdate {
                username: Some("bboy_kai".to_string()),
                full_name: "Kai Moreno".to_string(),
                bio: Some(String::new()),
                website: Some("https://kai.example".to_string()),
                dance_styles: vec![style.id],
            },
        )
        .await
        .unwrap();

        assert_eq!(profile.username.as_deref(), Some("bboy_kai"));
        assert_eq!(profile.bio, None);
        assert_eq!(profile.dance_styles, vec![style.id]);
    }

    #[tokio::test]
    async fn test_invalid_update_leaves_profile_untouched() {
        let h = harness();
        let user = h.user("kai@example.com", false, false).await;

        let result = update_profile(
            &h.state,
            &user,
            ProfileUpdate {
                username: None,
                full_name: "K".to_string(),
                bio: None,
                website: None,
                dance_styles: vec![],
            },
        )
        .await;

        assert!(result.is_err());
        let profile = get_profile(&h.state, &user).await.unwrap();
        assert_eq!(profile.full_name.as_deref(), Some("Test Dancer"));
    }
}
