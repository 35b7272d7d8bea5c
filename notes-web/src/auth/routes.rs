use axum::{
    extract::Query,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use minijinja::context;
use serde::Deserialize;
use tower_sessions::{session, Session};

use crate::{
    ctx::{self, BaseParams, SESSION_USER_KEY},
    errors::Error,
    shared::flash::Flash,
    state::AppState,
    users::auth::{self, SignInForm, SignUpForm},
    views::Views,
};

const SIGN_IN_PATH: &str = "/users/signin";
const SIGN_UP_PATH: &str = "/users/signup";

#[derive(Deserialize)]
pub struct Next {
    pub next: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(SIGN_UP_PATH, get(sign_up_view).post(sign_up))
        .route(SIGN_IN_PATH, get(sign_in_view).post(sign_in))
        .route("/users/logout", get(logout))
        .with_state(state)
}

/// Only same-site paths; anything else falls back to the notes list.
fn local_redirect(next: Option<&str>) -> &str {
    match next {
        Some(next) if next.starts_with('/') && !next.starts_with("//") => next,
        _ => "/notes",
    }
}

async fn sign_up_view(view: Views, flash: Flash, base: BaseParams) -> Response {
    view.page(&flash, base.ctx.user.as_ref(), "users/signup.html", context! {})
        .await
}

async fn sign_up(view: Views, flash: Flash, base: BaseParams, Form(form): Form<SignUpForm>) -> Response {
    let (name, email) = (form.name.clone(), form.email.clone());

    match auth::sign_up(base.db, form).await {
        Ok(_) => {
            flash.success("You are registered.").await;
            Redirect::to(SIGN_IN_PATH).into_response()
        }
        Err(Error::Validation(errors)) => {
            view.page(
                &flash,
                None,
                "users/signup.html",
                context! { errors => errors, name => name, email => email },
            )
            .await
        }
        Err(Error::EmailTaken) => {
            flash.error("The Email is already in use.").await;
            Redirect::to(SIGN_UP_PATH).into_response()
        }
        Err(err) => {
            tracing::error!("{err:?}");
            flash.error("An error occurred while signing up.").await;
            Redirect::to(SIGN_UP_PATH).into_response()
        }
    }
}

async fn sign_in_view(view: Views, flash: Flash, Query(Next { next }): Query<Next>) -> Response {
    view.page(
        &flash,
        None,
        "users/signin.html",
        context! { next => next.unwrap_or_default() },
    )
    .await
}

async fn sign_in(session: Session, flash: Flash, base: BaseParams, Form(form): Form<SignInForm>) -> Response {
    let user = match auth::authenticate(base.db, &form).await {
        Ok(user) => user,
        Err(Error::InvalidCredentials) => {
            flash.error("Incorrect email or password.").await;
            return Redirect::to(SIGN_IN_PATH).into_response();
        }
        Err(err) => {
            tracing::error!("{err:?}");
            flash.error("An error occurred while signing in.").await;
            return Redirect::to(SIGN_IN_PATH).into_response();
        }
    };

    let user_id = user.id;
    let stored: Result<(), session::Error> = async {
        session.cycle_id().await?;
        session.insert(SESSION_USER_KEY, ctx::User::from(user)).await
    }
    .await;

    if let Err(err) = stored {
        return Error::from(err).into_response();
    }

    tracing::info!(user_id = %user_id, "signed in");

    Redirect::to(local_redirect(form.next.as_deref())).into_response()
}

async fn logout(session: Session, flash: Flash) -> Response {
    let cleared: Result<(), session::Error> = async {
        session.remove::<ctx::User>(SESSION_USER_KEY).await?;
        session.cycle_id().await
    }
    .await;

    if let Err(err) = cleared {
        return Error::from(err).into_response();
    }

    flash.success("You are logged out now.").await;
    Redirect::to(SIGN_IN_PATH).into_response()
}
