use axum::{
	extract::{Query, State},
	http::header,
	response::{Html, IntoResponse, Redirect, Response},
};
use chrono::Utc;

use crate::{
	extract::{CsrfForm, CsrfToken, Session},
	form::{FormState, NON_FIELD_ERRORS},
	session,
	templates::{
		render, Context, LoginTemplate, PasswordChangeDoneTemplate, PasswordChangeTemplate,
		SignupTemplate,
	},
	AppState, Database, Error,
};

use super::{
	model::{self, User},
	redirect_target,
};

pub const PASSWORD_MISMATCH: &str = "The two password fields didn't match.";
const LOGIN_FAILED: &str =
	"Please enter a correct username and password. Note that both fields may be case-sensitive.";
const WRONG_OLD_PASSWORD: &str =
	"Your old password was entered incorrectly. Please enter it again.";

/// Counts users whose `column` equals `value`, ignoring case.
async fn taken(database: &Database, column: &str, value: &str) -> Result<bool, sqlx::Error> {
	let sql = match column {
		"username" => r#"SELECT COUNT(*) FROM "user" WHERE username = $1"#,
		_ => r#"SELECT COUNT(*) FROM "user" WHERE email = $1"#,
	};

	let count = sqlx::query_scalar::<_, i64>(sql)
		.bind(value)
		.fetch_one(database)
		.await?;

	Ok(count > 0)
}

fn taken_message(field: &str) -> String {
	format!("A user with that {field} already exists.")
}

/// Logs a user in, redirecting to `next`.
async fn start_session(
	database: &Database,
	user: &User,
	secure: bool,
	next: &str,
) -> Result<Response, Error> {
	let mut tx = database.begin().await?;

	let session_id = model::open_session(&mut *tx, user.id).await?;

	sqlx::query(r#"UPDATE "user" SET last_login = $1 WHERE id = $2"#)
		.bind(Utc::now())
		.bind(user.id)
		.execute(&mut *tx)
		.await?;

	tx.commit().await?;

	tracing::info!(user = %user.username, "logged in");

	let cookie = session::create_cookie(session_id, secure);

	Ok((
		[(header::SET_COOKIE, cookie.to_string())],
		Redirect::to(redirect_target(next)),
	)
		.into_response())
}

pub async fn signup_form(
	session: Option<Session>,
	csrf: CsrfToken,
) -> Result<Html<String>, Error> {
	render(&SignupTemplate {
		ctx: Context::new(session.as_ref(), csrf),
		input: model::SignupForm::default(),
		form: FormState::unbound(),
	})
}

pub async fn signup(
	State(state): State<AppState>,
	csrf: CsrfToken,
	CsrfForm(input): CsrfForm<model::SignupForm>,
) -> Result<Response, Error> {
	let mut form = FormState::validate(&input);

	if !form.has_error("password2") && input.password1 != input.password2 {
		form.add("password2", PASSWORD_MISMATCH);
	}

	for (field, value) in [("username", &input.username), ("email", &input.email)] {
		if !form.has_error(field) && taken(&state.database, field, value).await? {
			form.add(field, taken_message(field));
		}
	}

	if form.is_valid() {
		let created = User::create(
			&state.database,
			&state.hasher,
			&input.username,
			&input.email,
			&input.password1,
		)
		.await;

		match created {
			Ok(user) => {
				tracing::info!(user = %user.username, "signed up");

				return start_session(&state.database, &user, state.config.secure_cookies, "/")
					.await;
			}
			// Lost a race against another signup with the same name.
			Err(error) => match model::unique_violation(&error) {
				Some(field) => form.add(field, taken_message(field)),
				None => return Err(error),
			},
		}
	}

	Ok(render(&SignupTemplate {
		ctx: Context::new(None, csrf),
		input,
		form,
	})?
	.into_response())
}

pub async fn login_form(
	session: Option<Session>,
	csrf: CsrfToken,
	Query(query): Query<model::NextInput>,
) -> Result<Html<String>, Error> {
	render(&LoginTemplate {
		ctx: Context::new(session.as_ref(), csrf),
		input: model::LoginForm {
			next: query.next.unwrap_or_default(),
			..Default::default()
		},
		form: FormState::unbound(),
	})
}

pub async fn login(
	State(state): State<AppState>,
	csrf: CsrfToken,
	CsrfForm(input): CsrfForm<model::LoginForm>,
) -> Result<Response, Error> {
	let mut form = FormState::validate(&input);

	if form.is_valid() {
		let user = sqlx::query_as::<_, User>(r#"SELECT * FROM "user" WHERE username = $1"#)
			.bind(&input.username)
			.fetch_optional(&state.database)
			.await?;

		let authenticated = match &user {
			Some(user) => user
				.check_password(&state.hasher, &input.password)
				.map_err(super::Error::Argon)?,
			None => false,
		};

		match user {
			Some(user) if authenticated => {
				return start_session(
					&state.database,
					&user,
					state.config.secure_cookies,
					&input.next,
				)
				.await;
			}
			_ => form.add(NON_FIELD_ERRORS, LOGIN_FAILED),
		}
	}

	Ok(render(&LoginTemplate {
		ctx: Context::new(None, csrf),
		input,
		form,
	})?
	.into_response())
}

pub async fn logout(
	State(database): State<Database>,
	session: Option<Session>,
	CsrfForm(_): CsrfForm<model::EmptyForm>,
) -> Result<Response, Error> {
	if let Some(session) = session {
		sqlx::query("DELETE FROM session WHERE id = $1")
			.bind(session.id)
			.execute(&database)
			.await?;

		tracing::info!(user = %session.user.username, "logged out");
	}

	Ok((
		[(header::SET_COOKIE, session::clear_cookie().to_string())],
		Redirect::to("/"),
	)
		.into_response())
}

pub async fn password_change_form(
	session: Session,
	csrf: CsrfToken,
) -> Result<Html<String>, Error> {
	render(&PasswordChangeTemplate {
		ctx: Context::new(Some(&session), csrf),
		form: FormState::unbound(),
	})
}

pub async fn password_change(
	State(state): State<AppState>,
	session: Session,
	csrf: CsrfToken,
	CsrfForm(input): CsrfForm<model::PasswordChangeForm>,
) -> Result<Response, Error> {
	let mut form = FormState::validate(&input);

	if !form.has_error("old_password")
		&& !session
			.user
			.check_password(&state.hasher, &input.old_password)
			.map_err(super::Error::Argon)?
	{
		form.add("old_password", WRONG_OLD_PASSWORD);
	}

	if !form.has_error("new_password2") && input.new_password1 != input.new_password2 {
		form.add("new_password2", PASSWORD_MISMATCH);
	}

	if form.is_valid() {
		let mut tx = state.database.begin().await?;

		User::set_password(
			&mut tx,
			&state.hasher,
			session.user.id,
			&input.new_password1,
			Some(session.id),
		)
		.await?;

		tx.commit().await?;

		tracing::info!(user = %session.user.username, "password changed");

		return Ok(Redirect::to("/settings/password/done/").into_response());
	}

	Ok(render(&PasswordChangeTemplate {
		ctx: Context::new(Some(&session), csrf),
		form,
	})?
	.into_response())
}

pub async fn password_change_done(
	session: Session,
	csrf: CsrfToken,
) -> Result<Html<String>, Error> {
	render(&PasswordChangeDoneTemplate {
		ctx: Context::new(Some(&session), csrf),
	})
}
