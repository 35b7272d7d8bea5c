use rusqlite::{named_params, params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::{
    ctx::BaseParams,
    db::tokio_rusqlite,
    users::UserId,
    Error, Result,
};

use super::{NewNote, Note, NoteChanges, NoteId, NoteListItem, NOTE_NOT_FOUND};

impl<'a> TryFrom<&Row<'a>> for Note {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'a>) -> std::result::Result<Self, Self::Error> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            publication_date: row.get(3)?,
            owner: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }
}

impl<'a> TryFrom<&Row<'a>> for NoteListItem {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'a>) -> std::result::Result<Self, Self::Error> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

/// Loads a note and checks it belongs to `owner`. Runs inside a connection call so the
/// check and whatever follows it see the same row.
fn find_owned_note(conn: &Connection, note_id: NoteId, owner: UserId) -> std::result::Result<Note, tokio_rusqlite::Error> {
    let note = conn
        .query_row(
            "SELECT id, title, description, publication_date, owner, created_at, updated_at FROM notes WHERE id = ?",
            params![note_id],
            |row| Note::try_from(row),
        )
        .optional()?
        .ok_or_else(|| Error::NotFound(NOTE_NOT_FOUND.into()))?;

    if note.owner != owner {
        return Err(Error::Forbidden.into());
    }

    Ok(note)
}

pub async fn create_note(new_note: NewNote, BaseParams { db, ctx }: BaseParams) -> Result<Note> {
    let owner = ctx.require_user_id()?;

    new_note.validate().into_result()?;
    let publication_date = new_note
        .parse_publication_date()
        .map_err(|_| Error::Unexpected("publication date passed validation but did not parse".into()))?;

    let NewNote { title, description, .. } = new_note;
    let id = Uuid::now_v7();
    let created_at = chrono::Utc::now();
    let publication_date = publication_date.unwrap_or_else(|| created_at.date_naive());

    let note = db
        .call(move |conn| {
            conn.query_row(
                r#"INSERT INTO notes (id, title, description, publication_date, owner, created_at)
                    VALUES (:id, :title, :description, :publication_date, :owner, :created_at)
                    RETURNING id, title, description, publication_date, owner, created_at, updated_at"#,
                named_params! {
                    ":id": id,
                    ":title": title,
                    ":description": description,
                    ":publication_date": publication_date,
                    ":owner": owner,
                    ":created_at": created_at,
                },
                |row| Note::try_from(row),
            )
            .map_err(|e| e.into())
        })
        .await?;

    tracing::info!(note_id = %note.id, user_id = %owner, "note created");

    Ok(note)
}

/// The requester's notes, newest first.
pub async fn find_notes(BaseParams { db, ctx }: BaseParams) -> Result<Vec<NoteListItem>> {
    let owner = ctx.require_user_id()?;

    let notes = db
        .call(move |conn| {
            let notes = conn
                .prepare(
                    r#"SELECT id, title, description, created_at FROM notes
                    WHERE owner = ?
                    ORDER BY created_at DESC, id DESC"#,
                )?
                .query_map(params![owner], |row| NoteListItem::try_from(row))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(notes)
        })
        .await?;

    Ok(notes)
}

pub async fn get_note_for_edit(note_id: NoteId, BaseParams { db, ctx }: BaseParams) -> Result<Note> {
    let owner = ctx.require_user_id()?;

    let note = db.call(move |conn| find_owned_note(conn, note_id, owner)).await?;

    Ok(note)
}

pub async fn update_note(note_id: NoteId, changes: NoteChanges, BaseParams { db, ctx }: BaseParams) -> Result<Note> {
    let owner = ctx.require_user_id()?;

    let note = db
        .call(move |conn| {
            find_owned_note(conn, note_id, owner)?;

            changes.validate().into_result()?;
            let NoteChanges { title, description } = changes;

            conn.query_row(
                r#"UPDATE notes SET title = :title, description = :description, updated_at = :updated_at
                    WHERE id = :id
                    RETURNING id, title, description, publication_date, owner, created_at, updated_at"#,
                named_params! {
                    ":title": title,
                    ":description": description,
                    ":updated_at": chrono::Utc::now(),
                    ":id": note_id,
                },
                |row| Note::try_from(row),
            )
            .map_err(|e| e.into())
        })
        .await?;

    tracing::info!(note_id = %note.id, user_id = %owner, "note updated");

    Ok(note)
}

/// Removes the note. A missing id is not an error: `Ok(None)` and nothing changes.
pub async fn delete_note(note_id: NoteId, BaseParams { db, ctx }: BaseParams) -> Result<Option<Note>> {
    let owner = ctx.require_user_id()?;

    let deleted = db
        .call(move |conn| {
            match find_owned_note(conn, note_id, owner) {
                Ok(_) => {}
                Err(err) => {
                    return match Error::from(err) {
                        Error::NotFound(_) => Ok(None),
                        err => Err(err.into()),
                    }
                }
            }

            let note = conn.query_row(
                r#"DELETE FROM notes WHERE id = ?
                    RETURNING id, title, description, publication_date, owner, created_at, updated_at"#,
                params![note_id],
                |row| Note::try_from(row),
            )?;
            Ok(Some(note))
        })
        .await?;

    match &deleted {
        Some(note) => tracing::info!(note_id = %note.id, user_id = %owner, "note deleted"),
        None => tracing::debug!(note_id = %note_id, user_id = %owner, "note to delete does not exist"),
    }

    Ok(deleted)
}
