use axum::{response::IntoResponse, routing::get, Extension, Json, Router};
use minijinja::context;
use rand::Rng;
use serde_json::json;
use tower_sessions::{
    cookie::{time::Duration, SameSite},
    Expiry, MemoryStore, SessionManagerLayer,
};

use crate::{auth, config::config, ctx::BaseParams, db::DB, notes, shared::flash::Flash, views::Views};

use super::{errors, state::AppState};

pub async fn create_app(db: DB) -> errors::Result<Router> {
    let config = config();

    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(config.session_secure)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(Duration::days(config.session_inactivity_days)));

    let views = Views::with_templates();
    let state = AppState {
        conn: db.clone(),
        views,
    };

    let app = Router::new()
        .route("/", get(index))
        .route("/__version__", get(version))
        .route("/__heartbeat__", get(heartbeat))
        .route("/__lbheartbeat__", get(lbheartbeat))
        .with_state(state.clone())
        .merge(auth::router(state.clone()))
        .merge(notes::router(state))
        .layer(Extension(db))
        .layer(session_layer);

    Ok(app)
}

async fn index(view: Views, flash: Flash, base: BaseParams) -> impl IntoResponse {
    view.page(&flash, base.ctx.user.as_ref(), "index.html", context! {})
        .await
}

async fn version() -> impl IntoResponse {
    let config = config();
    Json(json!({
        "source" : config.source,
        "version": config.version,
        "commit" : config.git_commit,
        "build"  : config.pipeline_id
    }))
}

async fn heartbeat() -> impl IntoResponse {
    let mut rng = rand::thread_rng();
    let random: u32 = rng.gen_range(0..=10000);

    Json(json!({
        "status" : "ok",
        "random": random,
    }))
}

async fn lbheartbeat() -> impl IntoResponse {
    ""
}
