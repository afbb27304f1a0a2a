use actix_web::{web, HttpResponse};

use crate::db::repository::UserRepository;
use crate::error::ApiError;
use crate::middleware::auth_context::AuthenticatedUser;
use crate::models::user::{RoleUpdate, UserView};
use crate::routes::parse_id;
use crate::state::AppState;

pub async fn list_users(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let users = state.store.list_users().await?;
    let views: Vec<UserView> = users.iter().map(UserView::from).collect();
    Ok(HttpResponse::Ok().json(views))
}

pub async fn update_user_role(
    state: web::Data<AppState>,
    admin: AuthenticatedUser,
    path: web::Path<String>,
    input: web::Json<RoleUpdate>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "User")?;
    let role = input.into_inner().role;

    if !state.store.update_user_role(id, role).await? {
        return Err(ApiError::not_found("User"));
    }
    log::info!(
        "Admin {} set role of user {} to {}",
        admin.user_id,
        id,
        role.as_str()
    );

    let user = state
        .store
        .find_user_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;
    Ok(HttpResponse::Ok().json(UserView::from(&user)))
}
