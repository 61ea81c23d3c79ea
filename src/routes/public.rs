use askama::Template;
use askama_axum::IntoResponse as AskamaTemplateResponse;
use axum::{
    extract::{rejection::FormRejection, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use axum_extra::extract::PrivateCookieJar;
use tracing::info;

use crate::{
    auth::{self, CurrentUser},
    error::AppError,
    models::user::Credentials,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/login", get(login_form).post(login_submit))
        .route("/register", get(register_form).post(register_submit))
        .route("/logout", post(logout))
}

#[derive(Template)]
#[template(path = "home.html")]
struct HomeTemplate {
    logged_in: bool,
    username: String,
}

async fn home(current: CurrentUser) -> impl IntoResponse {
    let username = current
        .0
        .as_ref()
        .map(|user| user.username.clone())
        .unwrap_or_default();
    AskamaTemplateResponse::into_response(HomeTemplate {
        logged_in: current.0.is_some(),
        username,
    })
}

#[derive(Template)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    show_error: bool,
    error_message: String,
    username: String,
}

async fn login_form() -> impl IntoResponse {
    AskamaTemplateResponse::into_response(LoginTemplate {
        show_error: false,
        error_message: String::new(),
        username: String::new(),
    })
}

// The form is taken as a `Result` so a malformed body is still answered
// through the timing floor.
async fn login_submit(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    form: Result<Form<Credentials>, FormRejection>,
) -> Result<Response, AppError> {
    let credentials = form
        .map(|Form(credentials)| credentials)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()));
    let username = credentials
        .as_ref()
        .map(|credentials| credentials.username.clone())
        .unwrap_or_default();

    match state.login(credentials).await {
        Ok(session) => {
            info!(user_id = session.user_id, "user logged in");
            Ok((
                auth::apply_session_cookie(jar, &session),
                Redirect::to("/"),
            )
                .into_response())
        }
        Err(AppError::InvalidCredentials) => Ok(render_login_error(
            StatusCode::UNAUTHORIZED,
            username,
            "Invalid username or password".into(),
        )),
        Err(AppError::BadRequest(_)) => Ok(render_login_error(
            StatusCode::BAD_REQUEST,
            username,
            "Username and password are required".into(),
        )),
        Err(err) => Err(err),
    }
}

fn render_login_error(status: StatusCode, username: String, message: String) -> Response {
    (
        status,
        AskamaTemplateResponse::into_response(LoginTemplate {
            show_error: true,
            error_message: message,
            username,
        }),
    )
        .into_response()
}

#[derive(Template)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    show_error: bool,
    error_message: String,
    username: String,
}

async fn register_form() -> impl IntoResponse {
    AskamaTemplateResponse::into_response(RegisterTemplate {
        show_error: false,
        error_message: String::new(),
        username: String::new(),
    })
}

async fn register_submit(
    State(state): State<AppState>,
    Form(form): Form<Credentials>,
) -> Result<Response, AppError> {
    match state
        .credentials
        .register(&form.username, &form.password)
        .await
    {
        Ok(_) => Ok(Redirect::to("/login").into_response()),
        Err(AppError::DuplicateUsername) => Ok(render_register_error(
            StatusCode::CONFLICT,
            form.username,
            "Username already exists".into(),
        )),
        Err(AppError::BadRequest(msg)) => Ok(render_register_error(
            StatusCode::BAD_REQUEST,
            form.username,
            msg,
        )),
        Err(err) => Err(err),
    }
}

fn render_register_error(status: StatusCode, username: String, message: String) -> Response {
    (
        status,
        AskamaTemplateResponse::into_response(RegisterTemplate {
            show_error: true,
            error_message: message,
            username,
        }),
    )
        .into_response()
}

async fn logout(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, Redirect), AppError> {
    if let Some(token) = auth::session_token(&jar) {
        state.sessions.revoke(&token).await?;
    }
    Ok((auth::clear_session_cookie(jar), Redirect::to("/")))
}
