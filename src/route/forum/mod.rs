use axum::{http::StatusCode, routing::get, Router};

use crate::AppState;

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown forum {0}")]
	UnknownForum(i64),
}

impl Error {
	pub fn status(&self) -> StatusCode {
		match self {
			Self::UnknownForum(..) => StatusCode::NOT_FOUND,
		}
	}
}

pub fn routes() -> Router<AppState> {
	use route::*;

	Router::new()
		.route("/", get(home))
		.route("/forum/:id/", get(topics))
		.route("/forum/:id/new/", get(new_topic_form).post(new_topic))
}

#[cfg(test)]
mod test {
	use super::model::Forum;
	use crate::test::*;

	#[sqlx::test]
	async fn test_home_lists_forums(pool: Database) {
		let forum = create_forum(&pool).await;
		let client = Client::new(pool).await;

		let response = client.get("/").await;
		let html = response.text();

		assert_eq!(response.status_code(), StatusCode::OK);
		assert!(html.contains(&forum.name));
		assert!(html.contains(&format!(r#"href="/forum/{}/""#, forum.id)));
	}

	#[sqlx::test]
	async fn test_home_summarises_activity(pool: Database) {
		let forum = create_forum(&pool).await;
		let user = create_user(&pool, "john", "john@doe.com", "hunter2hunter").await;
		create_topic(&pool, forum.id, &user, "Hello, world!", "Some random text").await;

		let client = Client::new(pool).await;
		let summaries = super::model::ForumSummary::all(&client.database).await.unwrap();

		assert_eq!(summaries.len(), 1);
		assert_eq!(summaries[0].topics, 1);
		assert_eq!(summaries[0].posts, 1);
		assert_eq!(summaries[0].last_poster.as_deref(), Some("john"));
	}

	#[sqlx::test]
	async fn test_topics_page(pool: Database) {
		let forum = create_forum(&pool).await;
		let client = Client::new(pool).await;

		let response = client.get(&format!("/forum/{}/", forum.id)).await;
		let html = response.text();

		assert_eq!(response.status_code(), StatusCode::OK);
		assert!(html.contains(r#"href="/""#));
		assert!(html.contains(&format!(r#"href="/forum/{}/new/""#, forum.id)));
	}

	#[sqlx::test]
	async fn test_unknown_forum_is_not_found(pool: Database) {
		let client = Client::new(pool).await;

		assert_eq!(client.get("/forum/99/").await.status_code(), StatusCode::NOT_FOUND);
	}

	#[sqlx::test]
	async fn test_topics_are_paginated(pool: Database) {
		let forum = create_forum(&pool).await;
		let user = create_user(&pool, "john", "john@doe.com", "hunter2hunter").await;

		for i in 0..25 {
			create_topic(&pool, forum.id, &user, &format!("Topic {i:02}"), "Some random text")
				.await;
		}

		let client = Client::new(pool).await;

		let path = format!("/forum/{}/", forum.id);
		let html = client.get(&path).await.text();

		assert!(html.contains("Topic 24"));
		assert!(!html.contains("Topic 04"));

		let response = client.get_page(&path, "2").await;
		let html = response.text();

		assert_eq!(response.status_code(), StatusCode::OK);
		assert!(html.contains("Topic 04"));
		assert!(!html.contains("Topic 24"));

		// Past the end shows the last page, garbage shows the first.
		let response = client.get_page(&path, "99").await;
		let html = response.text();

		assert_eq!(response.status_code(), StatusCode::OK);
		assert!(html.contains("Topic 04"));
		assert!(!html.contains("Topic 24"));

		let response = client.get_page(&path, "abc").await;
		let html = response.text();

		assert_eq!(response.status_code(), StatusCode::OK);
		assert!(html.contains("Topic 24"));
		assert!(!html.contains("Topic 04"));
	}

	#[sqlx::test]
	async fn test_created_forums_are_visible_elsewhere(pool: Database) {
		let mut other = pool.acquire().await.unwrap();

		for i in 0..10 {
			let forum = create_forum_named(&pool, &format!("Forum {i}"), "Somewhere").await;
			let found = Forum::find(&mut *other, forum.id).await.unwrap();

			assert_eq!(found.name, forum.name);
		}
	}

	#[sqlx::test]
	async fn test_reply_count(pool: Database) {
		let forum = create_forum(&pool).await;
		let user = create_user(&pool, "john", "john@doe.com", "hunter2hunter").await;
		let topic = create_topic(&pool, forum.id, &user, "Hello, world!", "First").await;
		create_post(&pool, topic, &user, "Second").await;
		create_post(&pool, topic, &user, "Third").await;

		let topics = super::model::TopicSummary::list(&pool, forum.id, 20, 0)
			.await
			.unwrap();

		assert_eq!(topics[0].replies, 2);
		assert_eq!(topics[0].starter, "john");
	}

	#[sqlx::test]
	async fn test_new_topic_requires_login(pool: Database) {
		let forum = create_forum(&pool).await;
		let client = Client::new(pool).await;

		let path = format!("/forum/{}/new/", forum.id);
		let response = client.get(&path).await;

		assert_redirect(&response, &crate::route::auth::login_url(&path));
	}

	#[sqlx::test]
	async fn test_new_topic_page(pool: Database) {
		let forum = create_forum(&pool).await;
		create_user(&pool, "john", "john@doe.com", "hunter2hunter").await;
		let client = Client::new(pool).await;
		client.login("john", "hunter2hunter").await;

		let response = client.get(&format!("/forum/{}/new/", forum.id)).await;
		let html = response.text();

		assert_eq!(response.status_code(), StatusCode::OK);
		assert!(html.contains("csrfmiddlewaretoken"));
		assert!(html.contains(&format!(r#"href="/forum/{}/""#, forum.id)));

		let response = client.get("/forum/99/new/").await;

		assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
	}

	#[sqlx::test]
	async fn test_new_topic_valid_post_data(pool: Database) {
		let forum = create_forum(&pool).await;
		create_user(&pool, "john", "john@doe.com", "hunter2hunter").await;
		let client = Client::new(pool.clone()).await;
		client.login("john", "hunter2hunter").await;

		let response = client
			.post(
				&format!("/forum/{}/new/", forum.id),
				&[("subject", "Test title"), ("message", "Lorem ipsum dolor sit amet")],
			)
			.await;

		assert_redirect(&response, &format!("/forum/{}/topics/1/", forum.id));
		assert_eq!(count(&pool, "topic").await, 1);
		assert_eq!(count(&pool, "post").await, 1);
	}

	#[sqlx::test]
	async fn test_new_topic_invalid_post_data(pool: Database) {
		let forum = create_forum(&pool).await;
		create_user(&pool, "john", "john@doe.com", "hunter2hunter").await;
		let client = Client::new(pool.clone()).await;
		client.login("john", "hunter2hunter").await;

		let path = format!("/forum/{}/new/", forum.id);

		let response = client.post(&path, &[]).await;

		assert_eq!(response.status_code(), StatusCode::OK);

		let response = client
			.post(&path, &[("subject", ""), ("message", "   ")])
			.await;

		assert_eq!(response.status_code(), StatusCode::OK);
		assert!(response.text().contains("is-invalid"));
		assert_eq!(count(&pool, "topic").await, 0);
		assert_eq!(count(&pool, "post").await, 0);
	}

	#[sqlx::test]
	async fn test_new_topic_without_csrf_token(pool: Database) {
		let forum = create_forum(&pool).await;
		create_user(&pool, "john", "john@doe.com", "hunter2hunter").await;
		let client = Client::new(pool.clone()).await;
		client.login("john", "hunter2hunter").await;

		let response = client
			.server
			.post(&format!("/forum/{}/new/", forum.id))
			.form(&[("subject", "Test title"), ("message", "Lorem ipsum")])
			.await;

		assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
		assert_eq!(count(&pool, "topic").await, 0);
	}

	#[sqlx::test]
	async fn test_forum_names_are_unique(pool: Database) {
		Forum::create(&pool, "Banter", "Just casual talk").await.unwrap();

		assert!(Forum::create(&pool, "Banter", "Again").await.is_err());
		assert!(Forum::create(&pool, &"x".repeat(25), "Too long").await.is_err());
	}
}
