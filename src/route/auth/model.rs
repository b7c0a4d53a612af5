use argon2::Argon2;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{SqliteConnection, SqliteExecutor};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::form::{self, trim};

pub const KEY_LENGTH: usize = 32;

fn validate_username(username: &str) -> Result<(), ValidationError> {
	form::required(username)?;

	if username.chars().count() > 150 {
		return Err(form::invalid(
			"max_length",
			"Ensure this value has at most 150 characters.",
		));
	}

	if username
		.chars()
		.any(|c| !(c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_')))
	{
		return Err(form::invalid(
			"invalid_username",
			"Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
		));
	}

	Ok(())
}

/// A single user.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
	/// The unique identifier of the user, also used as the password salt.
	pub id: Uuid,
	/// The username that is displayed to the public.
	pub username: String,
	/// The user's e-mail address, used for password resets.
	pub email: String,
	/// The hashed password.
	pub password: Vec<u8>,
	pub created_at: DateTime<Utc>,
	pub last_login: Option<DateTime<Utc>>,
}

/// Hashes a password with Argon2, using the user's id as a salt.
pub fn hash_password(
	hasher: &Argon2,
	password: &str,
	id: &Uuid,
) -> Result<[u8; KEY_LENGTH], argon2::Error> {
	let mut hash = [0; KEY_LENGTH];

	hasher.hash_password_into(password.as_bytes(), id.as_bytes(), &mut hash)?;
	Ok(hash)
}

impl User {
	pub fn check_password(&self, hasher: &Argon2, password: &str) -> Result<bool, argon2::Error> {
		Ok(self.password == hash_password(hasher, password, &self.id)?)
	}

	/// Inserts a new user with a freshly hashed password.
	pub async fn create<'c>(
		executor: impl SqliteExecutor<'c>,
		hasher: &Argon2<'_>,
		username: &str,
		email: &str,
		password: &str,
	) -> Result<Self, crate::Error> {
		let id = Uuid::new_v4();
		let hashed = hash_password(hasher, password, &id).map_err(super::Error::Argon)?;

		let user = Self {
			id,
			username: username.to_owned(),
			email: email.to_owned(),
			password: hashed.to_vec(),
			created_at: Utc::now(),
			last_login: None,
		};

		sqlx::query(
			r#"
				INSERT INTO "user" (id, username, email, password, created_at)
				VALUES ($1, $2, $3, $4, $5)
			"#,
		)
		.bind(user.id)
		.bind(&user.username)
		.bind(&user.email)
		.bind(&user.password)
		.bind(user.created_at)
		.execute(executor)
		.await?;

		Ok(user)
	}

	/// Replaces the password of a user, dropping any outstanding reset tokens
	/// and every session except `keep`.
	pub async fn set_password(
		conn: &mut SqliteConnection,
		hasher: &Argon2<'_>,
		id: Uuid,
		password: &str,
		keep: Option<Uuid>,
	) -> Result<(), crate::Error> {
		let hashed = hash_password(hasher, password, &id).map_err(super::Error::Argon)?;

		sqlx::query(r#"UPDATE "user" SET password = $1 WHERE id = $2"#)
			.bind(&hashed[..])
			.bind(id)
			.execute(&mut *conn)
			.await?;

		sqlx::query("DELETE FROM password_reset WHERE user_id = $1")
			.bind(id)
			.execute(&mut *conn)
			.await?;

		sqlx::query("DELETE FROM session WHERE user_id = $1 AND ($2 IS NULL OR id != $2)")
			.bind(id)
			.bind(keep)
			.execute(&mut *conn)
			.await?;

		Ok(())
	}
}

/// Opens a new session for a user, returning its id.
pub async fn open_session<'c>(
	executor: impl SqliteExecutor<'c>,
	user_id: Uuid,
) -> Result<Uuid, sqlx::Error> {
	let id = Uuid::new_v4();

	sqlx::query("INSERT INTO session (id, user_id, created_at) VALUES ($1, $2, $3)")
		.bind(id)
		.bind(user_id)
		.bind(Utc::now())
		.execute(executor)
		.await?;

	Ok(id)
}

/// Which unique column a failed insert collided with, if any.
pub fn unique_violation(error: &crate::Error) -> Option<&'static str> {
	let crate::Error::Database(sqlx::Error::Database(error)) = error else {
		return None;
	};

	if !error.is_unique_violation() {
		return None;
	}

	if error.message().contains("user.username") {
		Some("username")
	} else if error.message().contains("user.email") {
		Some("email")
	} else {
		None
	}
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct SignupForm {
	#[serde(default, deserialize_with = "trim")]
	#[validate(custom(function = "validate_username"))]
	pub username: String,
	#[serde(default, deserialize_with = "trim")]
	#[validate(custom(function = "crate::form::validate_email"))]
	pub email: String,
	#[serde(default)]
	#[validate(custom(function = "crate::form::validate_password"))]
	pub password1: String,
	#[serde(default)]
	#[validate(custom(function = "crate::form::required"))]
	pub password2: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct LoginForm {
	#[serde(default, deserialize_with = "trim")]
	#[validate(custom(function = "crate::form::required"))]
	pub username: String,
	#[serde(default)]
	#[validate(custom(function = "crate::form::required"))]
	pub password: String,
	/// Where to go once logged in.
	#[serde(default)]
	pub next: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct NextInput {
	pub next: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct PasswordChangeForm {
	#[serde(default)]
	#[validate(custom(function = "crate::form::required"))]
	pub old_password: String,
	#[serde(default)]
	#[validate(custom(function = "crate::form::validate_password"))]
	pub new_password1: String,
	#[serde(default)]
	#[validate(custom(function = "crate::form::required"))]
	pub new_password2: String,
}

/// A form that carries nothing but its CSRF token.
#[derive(Debug, Deserialize)]
pub struct EmptyForm {}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_hash_is_salted_with_id() {
		let hasher = Argon2::default();
		let a = hash_password(&hasher, "hunter2hunter", &Uuid::new_v4()).unwrap();
		let b = hash_password(&hasher, "hunter2hunter", &Uuid::new_v4()).unwrap();

		assert_ne!(a, b);
	}

	#[test]
	fn test_signup_form_fields() {
		let form = SignupForm {
			username: "new_user".into(),
			email: "new@user.com".into(),
			password1: "new_password".into(),
			password2: "new_password".into(),
		};

		assert!(form.validate().is_ok());

		let form = SignupForm {
			username: "new user!".into(),
			email: "not-an-email".into(),
			password1: "1234".into(),
			password2: String::new(),
		};

		let errors = form.validate().unwrap_err();
		let fields = errors.field_errors();

		assert_eq!(fields.len(), 4);
	}
}
