use axum::{
    extract::{Extension, FromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Response},
    RequestPartsExt,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::{db::DB, errors::Error, users::UserId, Result};

pub const SESSION_USER_KEY: &str = "auth.user";

/// Everything a note or user operation needs from the request: who is asking and where to store things.
#[derive(Clone, Debug, FromRequestParts)]
pub struct BaseParams {
    pub ctx: Ctx,
    #[from_request(via(Extension))]
    pub db: DB,
}

impl BaseParams {
    pub fn new(db: DB, ctx: Ctx) -> Self {
        Self { db, ctx }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

#[derive(Clone, Debug)]
pub struct Ctx {
    pub user: Option<User>,
}

impl Ctx {
    pub fn new(user: Option<User>) -> Self {
        Self { user }
    }

    pub fn get_user_id(&self) -> Option<UserId> {
        self.user.as_ref().map(|u| u.id)
    }

    /// The authenticated user's id, the only source of note ownership.
    pub fn require_user_id(&self) -> Result<UserId> {
        self.get_user_id().ok_or(Error::Unauthorized)
    }
}

impl<S> FromRequestParts<S> for Ctx
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> std::result::Result<Self, Self::Rejection> {
        let session = parts.extract::<Session>().await.map_err(|e| e.into_response())?;

        let user = session
            .get::<User>(SESSION_USER_KEY)
            .await
            .map_err(|e| Error::from(e).into_response())?;

        Ok(Self { user })
    }
}
