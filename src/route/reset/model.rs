use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use sqlx::SqliteExecutor;
use uuid::Uuid;
use validator::Validate;

use crate::{form::trim, route::auth::model::User};

/// A single-use token that allows setting a new password without the old one.
#[derive(Debug, sqlx::FromRow)]
pub struct PasswordReset {
	pub token: Uuid,
	pub user_id: Uuid,
	pub created_at: DateTime<Utc>,
	pub expires_at: DateTime<Utc>,
}

impl PasswordReset {
	pub async fn issue<'c>(
		executor: impl SqliteExecutor<'c>,
		user_id: Uuid,
		ttl: Duration,
	) -> Result<Self, sqlx::Error> {
		let now = Utc::now();
		let reset = Self {
			token: Uuid::new_v4(),
			user_id,
			created_at: now,
			expires_at: now + ttl,
		};

		sqlx::query(
			r#"
				INSERT INTO password_reset (token, user_id, created_at, expires_at)
				VALUES ($1, $2, $3, $4)
			"#,
		)
		.bind(reset.token)
		.bind(reset.user_id)
		.bind(reset.created_at)
		.bind(reset.expires_at)
		.execute(executor)
		.await?;

		Ok(reset)
	}

	/// The user a link was issued to, if the link is still usable.
	pub async fn redeemable<'c>(
		executor: impl SqliteExecutor<'c>,
		uid: &str,
		token: &str,
	) -> Result<Option<User>, sqlx::Error> {
		let (Ok(uid), Ok(token)) = (Uuid::parse_str(uid), Uuid::parse_str(token)) else {
			return Ok(None);
		};

		sqlx::query_as::<_, User>(
			r#"
				SELECT "user".* FROM "user"
				JOIN password_reset ON password_reset.user_id = "user".id
				WHERE password_reset.token = $1 AND "user".id = $2 AND password_reset.expires_at > $3
			"#,
		)
		.bind(token)
		.bind(uid)
		.bind(Utc::now())
		.fetch_optional(executor)
		.await
	}
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct PasswordResetForm {
	#[serde(default, deserialize_with = "trim")]
	#[validate(custom(function = "crate::form::validate_email"))]
	pub email: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct SetPasswordForm {
	#[serde(default)]
	#[validate(custom(function = "crate::form::validate_password"))]
	pub new_password1: String,
	#[serde(default)]
	#[validate(custom(function = "crate::form::required"))]
	pub new_password2: String,
}
