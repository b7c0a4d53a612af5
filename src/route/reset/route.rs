use askama::Template;
use axum::{
	extract::{Path, State},
	response::{Html, IntoResponse, Redirect, Response},
};

use crate::{
	extract::{CsrfForm, CsrfToken, Session},
	form::FormState,
	mail::Message,
	route::auth::{model::User, route::PASSWORD_MISMATCH},
	templates::{
		render, Context, PasswordResetCompleteTemplate, PasswordResetConfirmTemplate,
		PasswordResetDoneTemplate, PasswordResetEmail, PasswordResetSubject,
		PasswordResetTemplate, SITE_NAME,
	},
	AppState, Database, Error,
};

use super::model::{PasswordReset, PasswordResetForm, SetPasswordForm};

pub async fn reset_form(
	session: Option<Session>,
	csrf: CsrfToken,
) -> Result<Html<String>, Error> {
	render(&PasswordResetTemplate {
		ctx: Context::new(session.as_ref(), csrf),
		input: PasswordResetForm::default(),
		form: FormState::unbound(),
	})
}

/// Mails a reset link to the owner of an e-mail address.
///
/// The response is the same whether or not the address is known.
pub async fn reset(
	State(state): State<AppState>,
	session: Option<Session>,
	csrf: CsrfToken,
	CsrfForm(input): CsrfForm<PasswordResetForm>,
) -> Result<Response, Error> {
	let form = FormState::validate(&input);

	if !form.is_valid() {
		return Ok(render(&PasswordResetTemplate {
			ctx: Context::new(session.as_ref(), csrf),
			input,
			form,
		})?
		.into_response());
	}

	let user = sqlx::query_as::<_, User>(r#"SELECT * FROM "user" WHERE email = $1"#)
		.bind(&input.email)
		.fetch_optional(&state.database)
		.await?;

	let Some(user) = user else {
		tracing::debug!("password reset requested for an unknown address");
		return Ok(Redirect::to("/reset/done/").into_response());
	};

	let reset = PasswordReset::issue(
		&state.database,
		user.id,
		state.config.password_reset_timeout,
	)
	.await?;

	let subject = PasswordResetSubject { site: SITE_NAME }.render()?;
	let body = PasswordResetEmail {
		site: SITE_NAME,
		base_url: state.config.base_url.trim_end_matches('/'),
		uid: user.id,
		token: reset.token,
		username: &user.username,
		email: &user.email,
	}
	.render()?;

	state
		.mailer
		.send(Message {
			to: user.email.clone(),
			subject: subject.trim().to_owned(),
			body,
		})
		.await?;

	tracing::info!(
		user = %user.username,
		expires_at = %reset.expires_at,
		"password reset link sent"
	);

	Ok(Redirect::to("/reset/done/").into_response())
}

pub async fn reset_done(
	session: Option<Session>,
	csrf: CsrfToken,
) -> Result<Html<String>, Error> {
	render(&PasswordResetDoneTemplate {
		ctx: Context::new(session.as_ref(), csrf),
	})
}

pub async fn confirm_form(
	State(database): State<Database>,
	Path((uid, token)): Path<(String, String)>,
	session: Option<Session>,
	csrf: CsrfToken,
) -> Result<Html<String>, Error> {
	let user = PasswordReset::redeemable(&database, &uid, &token).await?;

	render(&PasswordResetConfirmTemplate {
		ctx: Context::new(session.as_ref(), csrf),
		valid_link: user.is_some(),
		form: FormState::unbound(),
	})
}

/// Sets a new password through a reset link, which is used up on success.
pub async fn confirm(
	State(state): State<AppState>,
	Path((uid, token)): Path<(String, String)>,
	session: Option<Session>,
	csrf: CsrfToken,
	CsrfForm(input): CsrfForm<SetPasswordForm>,
) -> Result<Response, Error> {
	let ctx = Context::new(session.as_ref(), csrf);

	let Some(user) = PasswordReset::redeemable(&state.database, &uid, &token).await? else {
		return Ok(render(&PasswordResetConfirmTemplate {
			ctx,
			valid_link: false,
			form: FormState::unbound(),
		})?
		.into_response());
	};

	let mut form = FormState::validate(&input);

	if !form.has_error("new_password2") && input.new_password1 != input.new_password2 {
		form.add("new_password2", PASSWORD_MISMATCH);
	}

	if !form.is_valid() {
		return Ok(render(&PasswordResetConfirmTemplate {
			ctx,
			valid_link: true,
			form,
		})?
		.into_response());
	}

	let mut tx = state.database.begin().await?;

	User::set_password(&mut tx, &state.hasher, user.id, &input.new_password1, None).await?;

	tx.commit().await?;

	tracing::info!(user = %user.username, "password reset");

	Ok(Redirect::to("/reset/complete/").into_response())
}

pub async fn reset_complete(
	session: Option<Session>,
	csrf: CsrfToken,
) -> Result<Html<String>, Error> {
	render(&PasswordResetCompleteTemplate {
		ctx: Context::new(session.as_ref(), csrf),
	})
}
