//! Cross-site request forgery protection.
//!
//! Every response carries a `csrftoken` cookie, and every state-changing form
//! must echo the same value back in its `csrfmiddlewaretoken` field.

use std::sync::Arc;

use axum::{
	extract::{FromRequest, FromRequestParts, Request, State},
	http::{header, request, HeaderValue, StatusCode},
	middleware::Next,
	response::Response,
};
use cookie::{Cookie, SameSite};
use serde::{de, Deserialize};
use uuid::Uuid;

use crate::{config::Config, session};

pub const COOKIE_NAME: &str = "csrftoken";

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("no csrf cookie was sent")]
	MissingCookie,
	#[error("csrf token does not match the cookie")]
	Mismatch,
	#[error("csrf token was not issued for this request")]
	NotIssued,
}

impl Error {
	pub fn status(&self) -> StatusCode {
		match self {
			Self::MissingCookie | Self::Mismatch => StatusCode::FORBIDDEN,
			Self::NotIssued => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

/// The token for the current request, to be embedded in rendered forms.
#[derive(Debug, Clone)]
pub struct CsrfToken(pub String);

fn is_well_formed(token: &str) -> bool {
	token.len() == 32 && token.bytes().all(|b| b.is_ascii_hexdigit())
}

fn create_cookie(token: String, secure: bool) -> Cookie<'static> {
	Cookie::build((COOKIE_NAME, token))
		.secure(secure)
		.same_site(SameSite::Lax)
		.path("/")
		.max_age(cookie::time::Duration::days(365))
		.into()
}

/// Middleware that makes a token available to handlers, issuing a new
/// cookie when the client did not send a usable one.
pub async fn issue(
	State(config): State<Arc<Config>>,
	mut request: Request,
	next: Next,
) -> Response {
	let existing = session::find_cookie(request.headers(), COOKIE_NAME)
		.map(|cookie| cookie.value().to_owned())
		.filter(|token| is_well_formed(token));

	let (token, fresh) = match existing {
		Some(token) => (token, false),
		None => (Uuid::new_v4().simple().to_string(), true),
	};

	request.extensions_mut().insert(CsrfToken(token.clone()));

	let mut response = next.run(request).await;

	if fresh {
		let cookie = create_cookie(token, config.secure_cookies);

		match HeaderValue::from_str(&cookie.to_string()) {
			Ok(value) => {
				response.headers_mut().append(header::SET_COOKIE, value);
			}
			Err(error) => tracing::warn!(%error, "failed to encode csrf cookie"),
		}
	}

	response
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for CsrfToken
where
	S: Send + Sync,
{
	type Rejection = crate::Error;

	async fn from_request_parts(
		parts: &mut request::Parts,
		_state: &S,
	) -> Result<Self, Self::Rejection> {
		parts
			.extensions
			.get::<CsrfToken>()
			.cloned()
			.ok_or_else(|| Error::NotIssued.into())
	}
}

#[derive(Deserialize)]
struct Protected<T> {
	#[serde(default, rename = "csrfmiddlewaretoken")]
	token: String,
	#[serde(flatten)]
	data: T,
}

/// Extractor that deserializes a url-encoded form body after checking
/// its token against the `csrftoken` cookie.
///
/// Validation of the form itself is left to the handler, since invalid
/// input re-renders the form instead of rejecting the request.
///
/// ```rust
/// async fn route(CsrfForm(input): CsrfForm<PostForm>) {
///   // ...
/// }
/// ```
pub struct CsrfForm<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for CsrfForm<T>
where
	T: de::DeserializeOwned,
	S: Send + Sync,
{
	type Rejection = crate::Error;

	async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
		let cookie = session::find_cookie(req.headers(), COOKIE_NAME)
			.map(|cookie| cookie.value().to_owned())
			.ok_or(Error::MissingCookie)?;

		let form = axum::Form::<Protected<T>>::from_request(req, state).await?.0;

		if form.token.is_empty() || form.token != cookie {
			return Err(Error::Mismatch.into());
		}

		Ok(Self(form.data))
	}
}
