use axum_macros::FromRef;

use crate::{db::DB, shared::views::Views};

#[derive(FromRef, Clone)]
pub struct AppState {
    pub conn: DB,
    pub views: Views,
}
