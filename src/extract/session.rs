use axum::extract::{FromRef, FromRequestParts};
use axum::http::request;
use uuid::Uuid;

use crate::{route::auth, session, Database};

/// Extracts the session and related user from the request.
///
/// If there is no valid session, an [`auth::Error::LoginRequired`] is returned,
/// which responds with a redirect to the login form that leads back here.
/// Pages that are public but personalised take an `Option<Session>` instead.
///
/// ```rust
/// async fn route(session: Session) {
///   println!("{:?}", session.user);
/// }
/// ```
#[derive(Debug)]
pub struct Session {
	pub id: Uuid,
	pub user: auth::model::User,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Session
where
	Database: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = crate::Error;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let next = parts
			.uri
			.path_and_query()
			.map_or_else(|| parts.uri.path().to_owned(), |pq| pq.as_str().to_owned());

		let Some(session_id) = session::find_cookie(&parts.headers, session::COOKIE_NAME)
			.and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
		else {
			return Err(auth::Error::LoginRequired(next).into());
		};

		let database = Database::from_ref(state);
		let user = sqlx::query_as::<_, auth::model::User>(
			r#"
				SELECT "user".* FROM "user"
				JOIN session ON session.user_id = "user".id
				WHERE session.id = $1
			"#,
		)
		.bind(session_id)
		.fetch_optional(&database)
		.await?;

		let user = user.ok_or(auth::Error::LoginRequired(next))?;

		Ok(Session {
			user,
			id: session_id,
		})
	}
}
