use askama::Template;
use axum::{
	body::Body,
	extract::rejection::FormRejection,
	http::{Response, StatusCode},
	response::{Html, IntoResponse, Redirect},
};

use crate::{
	csrf, mail,
	route::{auth, forum, topic},
	templates::{Context, ErrorTemplate},
};

/// Error type for the application.
///
/// The Display trait is not sent to the client, so it can show
/// sensitive information. Clients only ever see the status code and
/// a generic description rendered into the error page.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("forum error: {0}")]
	Forum(#[from] forum::Error),
	#[error("topic error: {0}")]
	Topic(#[from] topic::Error),
	#[error("auth error: {0}")]
	Auth(#[from] auth::Error),
	#[error("csrf error: {0}")]
	Csrf(#[from] csrf::Error),
	#[error("form error: {0}")]
	Form(#[from] FormRejection),
	#[error("mail error: {0}")]
	Mail(#[from] mail::Error),
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
	#[error("template error: {0}")]
	Template(#[from] askama::Error),
}

impl Error {
	pub fn status(&self) -> StatusCode {
		match self {
			Self::Forum(error) => error.status(),
			Self::Topic(error) => error.status(),
			Self::Auth(error) => error.status(),
			Self::Csrf(error) => error.status(),
			Self::Form(rejection) => rejection.status(),
			Self::Mail(..) | Self::Database(..) | Self::Template(..) => {
				StatusCode::INTERNAL_SERVER_ERROR
			}
		}
	}

	/// The description shown to the client. It never includes the Display text.
	fn detail(&self) -> &'static str {
		match self.status() {
			StatusCode::NOT_FOUND => "The page you were looking for does not exist.",
			StatusCode::FORBIDDEN => "CSRF verification failed. Request aborted.",
			status if status.is_client_error() => "The submitted form could not be read.",
			_ => "Something went wrong on our side. Please try again later.",
		}
	}
}

impl IntoResponse for Error {
	fn into_response(self) -> Response<Body> {
		// Unauthenticated access is not an error page, only a detour to the login form.
		if let Self::Auth(auth::Error::LoginRequired(next)) = &self {
			return Redirect::to(&auth::login_url(next)).into_response();
		}

		let status = self.status();

		if status.is_server_error() {
			tracing::error!(error = %self, "request failed");
		} else {
			tracing::debug!(error = %self, %status, "request rejected");
		}

		let page = ErrorTemplate {
			ctx: Context::anonymous(),
			status: status.as_u16(),
			reason: status.canonical_reason().unwrap_or("Error"),
			detail: self.detail(),
		};

		match page.render() {
			Ok(html) => (status, Html(html)).into_response(),
			Err(error) => {
				tracing::error!(%error, "failed to render error page");
				status.into_response()
			}
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_status_codes() {
		assert_eq!(
			Error::from(forum::Error::UnknownForum(1)).status(),
			StatusCode::NOT_FOUND
		);
		assert_eq!(
			Error::from(topic::Error::UnknownPost(1)).status(),
			StatusCode::NOT_FOUND
		);
		assert_eq!(
			Error::from(csrf::Error::Mismatch).status(),
			StatusCode::FORBIDDEN
		);
		assert_eq!(
			Error::from(sqlx::Error::RowNotFound).status(),
			StatusCode::INTERNAL_SERVER_ERROR
		);
	}

	#[test]
	fn test_login_required_redirects() {
		let response =
			Error::from(auth::Error::LoginRequired("/forum/1/new/".into())).into_response();

		assert_eq!(response.status(), StatusCode::SEE_OTHER);
		assert_eq!(
			response.headers()["location"],
			"/login/?next=%2Fforum%2F1%2Fnew%2F"
		);
	}

	#[test]
	fn test_internal_errors_hide_details() {
		let response = Error::from(sqlx::Error::RowNotFound).into_response();

		assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
	}
}
