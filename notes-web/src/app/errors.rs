use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect},
};
use serde::Serialize;
use tower_sessions::session;

use crate::db;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("validation")]
    Validation(ValidationErrors),
    #[error("not_found")]
    NotFound(String),

    // auth
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("email_taken")]
    EmailTaken,
    #[error("invalid_credentials")]
    InvalidCredentials,

    #[error(transparent)]
    DB(db::Error),
    #[error("hash: {0}")]
    Hash(String),
    #[error(transparent)]
    Session(#[from] session::Error),

    #[error("unexpected: {0}")]
    Unexpected(String),
}

impl From<db::Error> for Error {
    fn from(error: db::Error) -> Self {
        match error {
            db::Error::NotFound(msg) => Self::NotFound(msg),
            error => Self::DB(error),
        }
    }
}

impl From<ValidationErrors> for Error {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

/// Carries an app error out of a `tokio_rusqlite` closure and back.
/// ```rust
/// impl From<Error> for tokio_rusqlite::Error { }
/// impl From<tokio_rusqlite::Error> for Error { }
/// ```
pub mod db_mappers {
    use super::*;
    use crate::db::tokio_rusqlite;

    impl From<tokio_rusqlite::Error> for Error {
        fn from(error: tokio_rusqlite::Error) -> Self {
            match error {
                tokio_rusqlite::Error::Other(err) if err.is::<Error>() => match err.downcast::<Error>() {
                    Ok(err) => *err,
                    Err(err) => Error::from(db::Error::from(tokio_rusqlite::Error::Other(err))),
                },
                error => Error::from(db::Error::from(error)),
            }
        }
    }

    impl From<Error> for tokio_rusqlite::Error {
        fn from(error: Error) -> Self {
            tokio_rusqlite::Error::Other(error.into())
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ValidationError {
    pub text: String,
}

/// Messages for the form fields that failed validation, in form order.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, text: impl Into<String>) {
        self.0.push(ValidationError { text: text.into() });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn messages(&self) -> Vec<&str> {
        self.0.iter().map(|e| e.text.as_str()).collect()
    }

    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self))
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        match self {
            Error::Unauthorized => Redirect::to("/users/signin").into_response(),
            Error::Forbidden => (StatusCode::FORBIDDEN, "Not Authorized").into_response(),
            Error::NotFound(message) => (StatusCode::NOT_FOUND, message).into_response(),
            Error::Validation(errors) => (StatusCode::BAD_REQUEST, errors.messages().join("\n")).into_response(),
            Error::EmailTaken => (StatusCode::CONFLICT, "The Email is already in use.").into_response(),
            Error::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Incorrect email or password.").into_response(),
            err => {
                tracing::error!("{err:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Unexpected error").into_response()
            }
        }
    }
}
