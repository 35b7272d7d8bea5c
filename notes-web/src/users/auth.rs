use rusqlite::{named_params, ErrorCode};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    db::{self, DB},
    errors::{Error, Result, ValidationErrors},
};

use super::{normalize_email, password, User, UserId};

pub const MIN_PASSWORD_LEN: usize = 4;

#[derive(Debug, Deserialize, Default)]
pub struct SignUpForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

impl SignUpForm {
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if self.name.trim().is_empty() {
            errors.add("Please Write a Name.");
        }
        if self.email.trim().is_empty() {
            errors.add("Please Write an Email.");
        }
        if self.password != self.confirm_password {
            errors.add("Passwords do not match.");
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.add("Passwords must be at least 4 characters.");
        }
        errors
    }
}

#[derive(Deserialize, Default)]
pub struct SignInForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub next: Option<String>,
}

impl std::fmt::Debug for SignInForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignInForm")
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .field("next", &self.next)
            .finish()
    }
}

pub async fn sign_up(db: DB, form: SignUpForm) -> Result<User> {
    form.validate().into_result()?;

    let email = normalize_email(&form.email);
    let name = form.name.trim().to_string();
    let password_hash = password::hash_password(&form.password)?;
    let id = Uuid::now_v7();

    let user = db
        .call(move |conn| {
            let inserted = conn.query_row(
                r#"INSERT INTO users (id, name, email, password_hash, created_at)
                    VALUES (:id, :name, :email, :password_hash, :created_at)
                    RETURNING id, name, email, password_hash, created_at"#,
                named_params! {
                    ":id": id,
                    ":name": name,
                    ":email": email,
                    ":password_hash": password_hash,
                    ":created_at": chrono::Utc::now(),
                },
                |r| User::try_from(r),
            );

            match inserted {
                Ok(user) => Ok(user),
                Err(rusqlite::Error::SqliteFailure(err, _)) if err.code == ErrorCode::ConstraintViolation => {
                    Err(Error::EmailTaken.into())
                }
                Err(err) => Err(err.into()),
            }
        })
        .await?;

    tracing::info!(user_id = %user.id, "user registered");

    Ok(user)
}

pub async fn find_one_by_email(db: DB, email: &str) -> db::Result<User> {
    let email = normalize_email(email);
    let not_found = format!("User '{email}' not found");

    db.call(move |conn| {
        conn.query_row(
            "SELECT id, name, email, password_hash, created_at FROM users WHERE email = ?",
            [email],
            |r| User::try_from(r),
        )
        .map_err(|e| e.into())
    })
    .await
    .map_err(db::Error::from)
    .map_err(|e| e.not_found_message(not_found))
}

/// Checks the submitted credentials. An unknown email and a wrong password give the same error
/// after the same hashing work.
pub async fn authenticate(db: DB, form: &SignInForm) -> Result<User> {
    let user = match find_one_by_email(db, &form.email).await {
        Ok(user) => user,
        Err(db::Error::NotFound(_)) => {
            password::verify_dummy(&form.password);
            return Err(Error::InvalidCredentials);
        }
        Err(err) => return Err(err.into()),
    };

    if !password::verify_password(&form.password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "password mismatch");
        return Err(Error::InvalidCredentials);
    }

    Ok(user)
}
