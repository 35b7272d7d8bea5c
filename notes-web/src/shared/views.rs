use std::{convert::Infallible, sync::Arc};

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
    response::{Html, IntoResponse, Response},
};
use minijinja::{context, Environment, Error, UndefinedBehavior, Value};

use crate::{ctx::User, shared::flash::Flash};

#[derive(Debug, Clone)]
pub struct Views {
    pub env: Arc<Environment<'static>>,
}

impl Views {
    pub fn new(env: Environment<'static>) -> Self {
        let engine = Arc::new(env);
        Self { env: engine }
    }

    /// Environment with every page of the app registered.
    pub fn with_templates() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Chainable);
        add_templates(&mut env);
        Self::new(env)
    }
}

impl Views {
    pub fn response<D: serde::Serialize>(&self, key: &str, data: D) -> Response {
        match self.render(key, data) {
            Ok(x) => Html(x).into_response(),
            Err(err) => {
                tracing::error!("failed to render {key}: {err:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
            }
        }
    }

    /// Full page render: drains pending flash messages and exposes the signed-in user to the layout.
    pub async fn page(&self, flash: &Flash, user: Option<&User>, key: &str, data: Value) -> Response {
        let messages = flash.take().await;
        self.response(key, context! { messages => messages, user => user, ..data })
    }

    fn render<D: serde::Serialize>(&self, key: &str, data: D) -> Result<String, Error> {
        let template = self.env.get_template(key)?;
        let rendered = template.render(&data)?;

        Ok(rendered)
    }
}

impl<ApplicationState> FromRequestParts<ApplicationState> for Views
where
    Self: FromRef<ApplicationState>,
    ApplicationState: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(_: &mut Parts, state: &ApplicationState) -> Result<Self, Self::Rejection> {
        Ok(Self::from_ref(state))
    }
}

macro_rules! templates {
    ($env:expr, [$($name:literal),* $(,)?]) => {
        $(
            if let Err(err) = $env.add_template($name, include_str!(concat!("../../templates/", $name))) {
                tracing::error!("invalid template {}: {err:?}", $name);
            }
        )*
    };
}

pub fn add_templates(env: &mut Environment<'static>) {
    templates!(
        env,
        [
            "layout.html",
            "index.html",
            "partials/messages.html",
            "partials/errors.html",
            "notes/new-note.html",
            "notes/all-notes.html",
            "notes/edit-note.html",
            "users/signup.html",
            "users/signin.html",
        ]
    );
}
