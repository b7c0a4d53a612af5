use cookie::{Cookie, SameSite};
use uuid::Uuid;

pub const COOKIE_NAME: &str = "session";

/// Creates a session cookie that lasts until the browser is closed
pub fn create_cookie(session_id: Uuid, secure: bool) -> Cookie<'static> {
	Cookie::build((COOKIE_NAME, session_id.to_string()))
		.secure(secure)
		.http_only(true)
		.same_site(SameSite::Lax)
		.path("/")
		.into()
}

/// Creates an empty session cookie used to invalidate a previous one
pub fn clear_cookie() -> Cookie<'static> {
	Cookie::build(COOKIE_NAME)
		.http_only(true)
		.path("/")
		.max_age(cookie::time::Duration::ZERO)
		.into()
}

/// Finds a cookie by name in the raw `Cookie` request headers.
pub fn find_cookie<'a>(
	headers: &'a axum::http::HeaderMap,
	name: &str,
) -> Option<Cookie<'a>> {
	headers
		.get_all(axum::http::header::COOKIE)
		.into_iter()
		.filter_map(|value| value.to_str().ok())
		.flat_map(Cookie::split_parse)
		.filter_map(Result::ok)
		.find(|cookie| cookie.name() == name)
}

#[cfg(test)]
mod test {
	use axum::http::{header, HeaderMap, HeaderValue};

	use super::*;

	#[test]
	fn test_find_cookie_across_headers() {
		let mut headers = HeaderMap::new();
		headers.append(header::COOKIE, HeaderValue::from_static("a=1; b=2"));
		headers.append(header::COOKIE, HeaderValue::from_static("session=abc"));

		assert_eq!(find_cookie(&headers, "b").unwrap().value(), "2");
		assert_eq!(find_cookie(&headers, COOKIE_NAME).unwrap().value(), "abc");
		assert!(find_cookie(&headers, "missing").is_none());
	}

	#[test]
	fn test_clear_cookie_expires_immediately() {
		let cookie = clear_cookie();

		assert_eq!(cookie.value(), "");
		assert_eq!(cookie.max_age(), Some(cookie::time::Duration::ZERO));
	}
}
