use axum::{
	http::StatusCode,
	routing::{get, post},
	Router,
};

use crate::AppState;

pub mod model;
pub mod route;

/// An error that can occur during authentication.
///
/// Note that the messages are logged, never presented to the client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("login required to access {0}")]
	LoginRequired(String),
	#[error("password hashing error")]
	Argon(#[from] argon2::Error),
}

impl Error {
	pub fn status(&self) -> StatusCode {
		match self {
			Self::LoginRequired(..) => StatusCode::UNAUTHORIZED,
			Self::Argon(..) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

pub fn routes() -> Router<AppState> {
	use route::*;

	Router::new()
		.route("/signup/", get(signup_form).post(signup))
		.route("/login/", get(login_form).post(login))
		.route("/logout/", post(logout))
		.route(
			"/settings/password/",
			get(password_change_form).post(password_change),
		)
		.route("/settings/password/done/", get(password_change_done))
}

/// The login form, with a `next` parameter that leads back to `next` once
/// logged in.
pub fn login_url(next: &str) -> String {
	match serde_urlencoded::to_string([("next", next)]) {
		Ok(query) => format!("/login/?{query}"),
		Err(_) => String::from("/login/"),
	}
}

/// Only same-site paths are followed after logging in.
pub fn redirect_target(next: &str) -> &str {
	if next.starts_with('/') && !next.starts_with("//") && !next.starts_with("/\\") {
		next
	} else {
		"/"
	}
}
