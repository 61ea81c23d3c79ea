use askama::Template;
use askama_axum::IntoResponse as AskamaTemplateResponse;
use axum::{response::IntoResponse, routing::get, Router};

use crate::{auth::CurrentUser, error::AppError, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(dashboard))
}

#[derive(Template)]
#[template(path = "user/dashboard.html")]
struct DashboardTemplate {
    username: String,
    user_id: i64,
}

async fn dashboard(current: CurrentUser) -> Result<impl IntoResponse, AppError> {
    let user = current.require_user()?;
    Ok(AskamaTemplateResponse::into_response(DashboardTemplate {
        username: user.username.clone(),
        user_id: user.id,
    }))
}
