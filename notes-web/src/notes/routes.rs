use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use minijinja::context;
use serde_json::json;

use crate::{auth, ctx::BaseParams, errors::Error, shared::flash::Flash, state::AppState, views::Views};

use super::{handlers, NewNote, NoteChanges, NoteId, NOTE_NOT_FOUND};

const NOTES_PATH: &str = "/notes";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/notes", get(notes_view))
        .route("/notes/add", get(new_note_view))
        .route("/notes/new-note", post(create_note))
        .route("/notes/edit/{note_id}", get(edit_note_view))
        .route("/notes/edit-note/{note_id}", post(update_note).put(update_note))
        .route("/notes/delete/{note_id}", post(delete_note).delete(delete_note))
        .with_state(state)
        .layer(middleware::from_fn(auth::middleware::protected_view))
}

/// Error flash plus redirect to the list; storage failures get `fallback` instead of their details.
async fn redirect_with_error(flash: &Flash, err: Error, fallback: &str) -> Response {
    match err {
        Error::Unauthorized => return err.into_response(),
        Error::Forbidden => flash.error("Not Authorized").await,
        Error::NotFound(message) => flash.error(message).await,
        err => {
            tracing::error!("{err:?}");
            flash.error(fallback).await;
        }
    }
    Redirect::to(NOTES_PATH).into_response()
}

/// The `{note_id}` segment. A malformed id is treated like a missing note.
struct NoteIdPath(NoteId);

impl<S> FromRequestParts<S> for NoteIdPath
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        if let Ok(note_id) = NoteId::parse_str(&raw) {
            return Ok(Self(note_id));
        }

        tracing::debug!(note_id = %raw, "malformed note id");
        let flash = Flash::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        Err(redirect_with_error(&flash, Error::NotFound(NOTE_NOT_FOUND.into()), NOTE_NOT_FOUND).await)
    }
}

async fn notes_view(view: Views, flash: Flash, base: BaseParams) -> Response {
    let user = base.ctx.user.clone();

    match handlers::find_notes(base).await {
        Ok(notes) => {
            view.page(&flash, user.as_ref(), "notes/all-notes.html", context! { notes => notes })
                .await
        }
        Err(err) => {
            tracing::error!("{err:?}");
            view.page(
                &flash,
                user.as_ref(),
                "notes/all-notes.html",
                context! { notes => json!([]), error => "An error occurred while loading the notes." },
            )
            .await
        }
    }
}

async fn new_note_view(view: Views, flash: Flash, base: BaseParams) -> Response {
    view.page(&flash, base.ctx.user.as_ref(), "notes/new-note.html", context! {})
        .await
}

async fn create_note(view: Views, flash: Flash, base: BaseParams, Form(form): Form<NewNote>) -> Response {
    let user = base.ctx.user.clone();

    match handlers::create_note(form.clone(), base).await {
        Ok(_) => {
            flash.success("Note Added Successfully").await;
            Redirect::to(NOTES_PATH).into_response()
        }
        Err(Error::Validation(errors)) => {
            view.page(
                &flash,
                user.as_ref(),
                "notes/new-note.html",
                context! {
                    errors => errors,
                    title => form.title,
                    description => form.description,
                    publication_date => form.publication_date.unwrap_or_default(),
                },
            )
            .await
        }
        Err(err) => redirect_with_error(&flash, err, "An error occurred while adding the note.").await,
    }
}

async fn edit_note_view(NoteIdPath(note_id): NoteIdPath, view: Views, flash: Flash, base: BaseParams) -> Response {
    let user = base.ctx.user.clone();

    match handlers::get_note_for_edit(note_id, base).await {
        Ok(note) => {
            view.page(&flash, user.as_ref(), "notes/edit-note.html", context! { note => note })
                .await
        }
        Err(err) => redirect_with_error(&flash, err, "An error occurred while loading the note.").await,
    }
}

async fn update_note(
    NoteIdPath(note_id): NoteIdPath,
    view: Views,
    flash: Flash,
    base: BaseParams,
    Form(changes): Form<NoteChanges>,
) -> Response {
    let user = base.ctx.user.clone();

    match handlers::update_note(note_id, changes.clone(), base).await {
        Ok(_) => {
            flash.success("Note Updated Successfully").await;
            Redirect::to(NOTES_PATH).into_response()
        }
        Err(Error::Validation(errors)) => {
            view.page(
                &flash,
                user.as_ref(),
                "notes/edit-note.html",
                context! {
                    errors => errors,
                    note => context! {
                        id => note_id,
                        title => changes.title,
                        description => changes.description,
                    },
                },
            )
            .await
        }
        Err(err) => redirect_with_error(&flash, err, "An error occurred while updating the note.").await,
    }
}

async fn delete_note(NoteIdPath(note_id): NoteIdPath, flash: Flash, base: BaseParams) -> Response {
    match handlers::delete_note(note_id, base).await {
        Ok(_) => {
            flash.success("Note Deleted Successfully").await;
            Redirect::to(NOTES_PATH).into_response()
        }
        Err(err) => redirect_with_error(&flash, err, "An error occurred while deleting the note.").await,
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;

    use crate::{
        db::{init_test_db, DB},
        errors::Result,
        tests::{sign_in, test_server},
        users::auth::find_one_by_email,
    };

    fn note_id_from(html: &str) -> String {
        let start = html.find("/notes/edit/").expect("no edit link") + "/notes/edit/".len();
        html[start..start + 36].to_string()
    }

    async fn create(server: &TestServer, title: &str, description: &str) {
        let response = server
            .post("/notes/new-note")
            .form(&[("title", title), ("description", description)])
            .await;
        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), "/notes");
    }

    async fn owners(db: &DB) -> Vec<uuid::Uuid> {
        db.call(|conn| {
            let owners = conn
                .prepare("SELECT owner FROM notes")?
                .query_map([], |r| r.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(owners)
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn anonymous_is_sent_to_sign_in() -> Result<()> {
        let db = init_test_db().await?;
        let server = test_server(db).await?;

        let response = server.get("/notes").await;

        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), "/users/signin?next=/notes");
        Ok(())
    }

    #[tokio::test]
    async fn create_and_list() -> Result<()> {
        let db = init_test_db().await?;
        let server = test_server(db).await?;
        sign_in(&server, "ann@mail.com").await;

        create(&server, "T", "D").await;

        let page = server.get("/notes").await;
        assert_eq!(page.status_code(), StatusCode::OK);
        let html = page.text();
        assert!(html.contains("Note Added Successfully"));
        assert!(html.contains("<h3>T</h3>"));
        assert!(html.contains("<p>D</p>"));
        assert_eq!(html.matches("class=\"note\"").count(), 1);

        // flash is shown once
        let html = server.get("/notes").await.text();
        assert!(!html.contains("Note Added Successfully"));
        Ok(())
    }

    #[tokio::test]
    async fn create_with_missing_fields_renders_errors() -> Result<()> {
        let db = init_test_db().await?;
        let server = test_server(db.clone()).await?;
        sign_in(&server, "ann@mail.com").await;

        let response = server.post("/notes/new-note").form(&[("title", "Only title")]).await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let html = response.text();
        assert!(html.contains("Please Write a Description"));
        assert!(!html.contains("Please Write a Title."));
        assert!(html.contains("value=\"Only title\""));
        assert!(owners(&db).await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn owner_comes_from_session() -> Result<()> {
        let db = init_test_db().await?;
        let server = test_server(db.clone()).await?;
        sign_in(&server, "ann@mail.com").await;
        let ann = find_one_by_email(db.clone(), "ann@mail.com").await?.id;
        let other = uuid::Uuid::now_v7().to_string();

        let response = server
            .post("/notes/new-note")
            .form(&[("title", "T"), ("description", "D"), ("user", other.as_str()), ("owner", other.as_str())])
            .await;

        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
        assert_eq!(owners(&db).await, vec![ann]);
        Ok(())
    }

    #[tokio::test]
    async fn notes_are_private() -> Result<()> {
        let db = init_test_db().await?;
        let ann = test_server(db.clone()).await?;
        let bob = test_server(db).await?;
        sign_in(&ann, "ann@mail.com").await;
        sign_in(&bob, "bob@mail.com").await;

        create(&ann, "ann note", "secret").await;
        let note_id = note_id_from(&ann.get("/notes").await.text());

        let html = bob.get("/notes").await.text();
        assert!(!html.contains("ann note"));
        assert!(!html.contains("secret"));

        let response = bob.get(&format!("/notes/edit/{note_id}")).await;
        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), "/notes");
        assert!(bob.get("/notes").await.text().contains("Not Authorized"));

        let response = bob
            .post(&format!("/notes/edit-note/{note_id}"))
            .form(&[("title", "hacked"), ("description", "hacked")])
            .await;
        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);

        let response = bob.post(&format!("/notes/delete/{note_id}")).await;
        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);

        let html = ann.get(&format!("/notes/edit/{note_id}")).await.text();
        assert!(html.contains("value=\"ann note\""));
        assert!(!html.contains("hacked"));
        Ok(())
    }

    #[tokio::test]
    async fn edit_and_update() -> Result<()> {
        let db = init_test_db().await?;
        let server = test_server(db).await?;
        sign_in(&server, "ann@mail.com").await;
        create(&server, "T", "D").await;
        let note_id = note_id_from(&server.get("/notes").await.text());

        let form = server.get(&format!("/notes/edit/{note_id}")).await;
        assert_eq!(form.status_code(), StatusCode::OK);
        assert!(form.text().contains("value=\"T\""));

        let response = server
            .put(&format!("/notes/edit-note/{note_id}"))
            .form(&[("title", "T2"), ("description", "D2")])
            .await;
        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);

        let html = server.get("/notes").await.text();
        assert!(html.contains("Note Updated Successfully"));
        assert!(html.contains("<h3>T2</h3>"));
        Ok(())
    }

    #[tokio::test]
    async fn update_with_missing_fields_renders_form() -> Result<()> {
        let db = init_test_db().await?;
        let server = test_server(db).await?;
        sign_in(&server, "ann@mail.com").await;
        create(&server, "T", "D").await;
        let note_id = note_id_from(&server.get("/notes").await.text());

        let response = server
            .post(&format!("/notes/edit-note/{note_id}"))
            .form(&[("title", ""), ("description", "D2")])
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        assert!(response.text().contains("Please Write a Title."));
        assert!(server.get("/notes").await.text().contains("<h3>T</h3>"));
        Ok(())
    }

    #[tokio::test]
    async fn edit_of_missing_note_redirects() -> Result<()> {
        let db = init_test_db().await?;
        let server = test_server(db).await?;
        sign_in(&server, "ann@mail.com").await;

        let response = server.get(&format!("/notes/edit/{}", uuid::Uuid::now_v7())).await;

        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
        assert!(server.get("/notes").await.text().contains("Note not found"));
        Ok(())
    }

    #[tokio::test]
    async fn delete() -> Result<()> {
        let db = init_test_db().await?;
        let server = test_server(db.clone()).await?;
        sign_in(&server, "ann@mail.com").await;
        create(&server, "T", "D").await;
        let note_id = note_id_from(&server.get("/notes").await.text());

        let response = server.delete(&format!("/notes/delete/{note_id}")).await;
        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
        assert!(owners(&db).await.is_empty());

        // again, now missing
        let response = server.post(&format!("/notes/delete/{note_id}")).await;
        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
        assert!(server.get("/notes").await.text().contains("Note Deleted Successfully"));
        Ok(())
    }

    #[tokio::test]
    async fn foreign_update_with_blank_fields_is_not_authorized() -> Result<()> {
        let db = init_test_db().await?;
        let ann = test_server(db.clone()).await?;
        let bob = test_server(db).await?;
        sign_in(&ann, "ann@mail.com").await;
        sign_in(&bob, "bob@mail.com").await;
        create(&ann, "T", "D").await;
        let note_id = note_id_from(&ann.get("/notes").await.text());

        let response = bob
            .post(&format!("/notes/edit-note/{note_id}"))
            .form(&[("title", ""), ("description", "")])
            .await;
        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), "/notes");
        let html = bob.get("/notes").await.text();
        assert!(html.contains("Not Authorized"));
        assert!(!html.contains("Please Write a Title."));

        let response = bob
            .post(&format!("/notes/edit-note/{}", uuid::Uuid::now_v7()))
            .form(&[("title", ""), ("description", "")])
            .await;
        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
        assert!(bob.get("/notes").await.text().contains("Note not found"));
        Ok(())
    }

    #[tokio::test]
    async fn malformed_note_id_redirects() -> Result<()> {
        let db = init_test_db().await?;
        let server = test_server(db).await?;
        sign_in(&server, "ann@mail.com").await;

        let response = server.get("/notes/edit/not-a-uuid").await;
        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), "/notes");
        assert!(server.get("/notes").await.text().contains("Note not found"));

        let response = server
            .post("/notes/edit-note/not-a-uuid")
            .form(&[("title", "T"), ("description", "D")])
            .await;
        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);

        let response = server.post("/notes/delete/not-a-uuid").await;
        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), "/notes");
        Ok(())
    }

    #[tokio::test]
    async fn storage_failures_flash_and_redirect() -> Result<()> {
        let db = init_test_db().await?;
        let server = test_server(db.clone()).await?;
        sign_in(&server, "ann@mail.com").await;
        create(&server, "T", "D").await;
        let note_id = note_id_from(&server.get("/notes").await.text());

        db.call(|conn| {
            conn.execute_batch("DROP TABLE notes")?;
            Ok(())
        })
        .await?;

        let response = server
            .post("/notes/new-note")
            .form(&[("title", "T2"), ("description", "D2")])
            .await;
        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), "/notes");

        let page = server.get("/notes").await;
        assert_eq!(page.status_code(), StatusCode::OK);
        let html = page.text();
        assert!(html.contains("An error occurred while adding the note."));
        assert!(html.contains("An error occurred while loading the notes."));

        let response = server.get(&format!("/notes/edit/{note_id}")).await;
        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
        assert!(server.get("/notes").await.text().contains("An error occurred while loading the note."));

        let response = server
            .post(&format!("/notes/edit-note/{note_id}"))
            .form(&[("title", "T2"), ("description", "D2")])
            .await;
        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
        assert!(server.get("/notes").await.text().contains("An error occurred while updating the note."));

        let response = server.post(&format!("/notes/delete/{note_id}")).await;
        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), "/notes");
        assert!(server.get("/notes").await.text().contains("An error occurred while deleting the note."));
        Ok(())
    }
}
