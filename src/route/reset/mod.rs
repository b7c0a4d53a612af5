use axum::{routing::get, Router};

use crate::AppState;

pub mod model;
pub mod route;

pub fn routes() -> Router<AppState> {
	use route::*;

	Router::new()
		.route("/reset/", get(reset_form).post(reset))
		.route("/reset/done/", get(reset_done))
		.route("/reset/:uid/:token/", get(confirm_form).post(confirm))
		.route("/reset/complete/", get(reset_complete))
}

#[cfg(test)]
mod test {
	use std::sync::Arc;

	use super::model::PasswordReset;
	use crate::{mail::MemoryMailer, test::*};

	/// Pulls the confirm path out of a reset e-mail.
	fn reset_path(body: &str) -> String {
		let start = body.find("/reset/").unwrap();
		let end = start + body[start..].find(char::is_whitespace).unwrap_or(body.len() - start);

		body[start..end].to_owned()
	}

	#[sqlx::test]
	async fn test_reset_page(pool: Database) {
		let client = Client::new(pool).await;

		let response = client.get("/reset/").await;
		let html = response.text();

		assert_eq!(response.status_code(), StatusCode::OK);
		assert!(html.contains("csrfmiddlewaretoken"));
		assert!(html.contains(r#"type="email""#));
	}

	#[sqlx::test]
	async fn test_reset_unknown_email(pool: Database) {
		let mailer = Arc::new(MemoryMailer::default());
		let client = Client::with_mailer(pool.clone(), mailer.clone()).await;

		let response = client
			.post("/reset/", &[("email", "donotexist@email.com")])
			.await;

		assert_redirect(&response, "/reset/done/");
		assert!(mailer.outbox().is_empty());
		assert_eq!(count(&pool, "password_reset").await, 0);
	}

	#[sqlx::test]
	async fn test_reset_invalid_email(pool: Database) {
		let client = Client::new(pool).await;

		let response = client.post("/reset/", &[("email", "not an email")]).await;

		assert_eq!(response.status_code(), StatusCode::OK);
		assert!(response.text().contains("Enter a valid email address."));
	}

	#[sqlx::test]
	async fn test_reset_flow(pool: Database) {
		let user = create_user(&pool, "john", "john@doe.com", "old_password").await;
		let mailer = Arc::new(MemoryMailer::default());
		let client = Client::with_mailer(pool.clone(), mailer.clone()).await;

		let response = client.post("/reset/", &[("email", "john@doe.com")]).await;

		assert_redirect(&response, "/reset/done/");

		let outbox = mailer.outbox();

		assert_eq!(outbox.len(), 1);
		assert_eq!(outbox[0].to, "john@doe.com");
		assert!(!outbox[0].subject.contains('\n'));

		let path = reset_path(&outbox[0].body);

		assert!(path.starts_with(&format!("/reset/{}/", user.id)));

		let response = client.get(&path).await;
		let html = response.text();

		assert_eq!(response.status_code(), StatusCode::OK);
		assert!(html.contains("csrfmiddlewaretoken"));
		assert_eq!(html.matches(r#"type="password""#).count(), 2);

		let response = client
			.post(
				&path,
				&[
					("new_password1", "new_password"),
					("new_password2", "new_password"),
				],
			)
			.await;

		assert_redirect(&response, "/reset/complete/");

		let user = reload_user(&pool, user.id).await;

		assert!(user.check_password(&Argon2::default(), "new_password").unwrap());

		// The link is used up.
		let response = client.get(&path).await;

		assert_eq!(response.status_code(), StatusCode::OK);
		assert!(response.text().contains("Password reset link invalid"));
		assert!(response.text().contains(r#"href="/reset/""#));
	}

	#[sqlx::test]
	async fn test_reset_confirm_mismatch(pool: Database) {
		let user = create_user(&pool, "john", "john@doe.com", "old_password").await;
		let mailer = Arc::new(MemoryMailer::default());
		let client = Client::with_mailer(pool.clone(), mailer.clone()).await;

		client.post("/reset/", &[("email", "john@doe.com")]).await;

		let path = reset_path(&mailer.outbox()[0].body);

		let response = client
			.post(
				&path,
				&[
					("new_password1", "new_password"),
					("new_password2", "other_password"),
				],
			)
			.await;

		assert_eq!(response.status_code(), StatusCode::OK);
		assert!(response.text().contains("is-invalid"));

		let user = reload_user(&pool, user.id).await;

		assert!(user.check_password(&Argon2::default(), "old_password").unwrap());
	}

	#[sqlx::test]
	async fn test_issued_links_are_redeemable_elsewhere(pool: Database) {
		let user = create_user(&pool, "john", "john@doe.com", "old_password").await;
		let mut other = pool.acquire().await.unwrap();

		for _ in 0..10 {
			let reset = PasswordReset::issue(&pool, user.id, chrono::Duration::hours(1))
				.await
				.unwrap();
			let redeemed = PasswordReset::redeemable(
				&mut *other,
				&user.id.to_string(),
				&reset.token.to_string(),
			)
			.await
			.unwrap();

			assert_eq!(redeemed.map(|user| user.id), Some(user.id));
		}
	}

	#[sqlx::test]
	async fn test_reset_garbage_link(pool: Database) {
		let client = Client::new(pool).await;

		let response = client.get("/reset/not-a-user/not-a-token/").await;

		assert_eq!(response.status_code(), StatusCode::OK);
		assert!(response.text().contains("Password reset link invalid"));
	}

	#[sqlx::test]
	async fn test_reset_drops_sessions(pool: Database) {
		create_user(&pool, "john", "john@doe.com", "old_password").await;
		let mailer = Arc::new(MemoryMailer::default());
		let client = Client::with_mailer(pool.clone(), mailer.clone()).await;
		client.login("john", "old_password").await;

		assert_eq!(count(&pool, "session").await, 1);

		client.post("/reset/", &[("email", "JOHN@doe.com")]).await;

		let path = reset_path(&mailer.outbox()[0].body);

		client
			.post(
				&path,
				&[
					("new_password1", "new_password"),
					("new_password2", "new_password"),
				],
			)
			.await;

		assert_eq!(count(&pool, "session").await, 0);
		assert_eq!(count(&pool, "password_reset").await, 0);
	}
}
