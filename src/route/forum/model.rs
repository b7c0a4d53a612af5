use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::SqliteExecutor;
use validator::Validate;

use crate::form::trim;

use super::Error;

/// A named category of topics.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Forum {
	pub id: i64,
	pub name: String,
	pub description: String,
}

impl Forum {
	/// Fetches a forum, or [`Error::UnknownForum`] if there is none with this id.
	pub async fn find<'c>(
		executor: impl SqliteExecutor<'c>,
		id: i64,
	) -> Result<Self, crate::Error> {
		sqlx::query_as::<_, Self>("SELECT * FROM forum WHERE id = $1")
			.bind(id)
			.fetch_optional(executor)
			.await?
			.ok_or_else(|| Error::UnknownForum(id).into())
	}

	pub async fn create<'c>(
		executor: impl SqliteExecutor<'c>,
		name: &str,
		description: &str,
	) -> Result<Self, sqlx::Error> {
		let id = sqlx::query("INSERT INTO forum (name, description) VALUES ($1, $2)")
			.bind(name)
			.bind(description)
			.execute(executor)
			.await?
			.last_insert_rowid();

		Ok(Self {
			id,
			name: name.to_owned(),
			description: description.to_owned(),
		})
	}
}

/// A row of the forum index.
#[derive(Debug, sqlx::FromRow)]
pub struct ForumSummary {
	pub id: i64,
	pub name: String,
	pub description: String,
	pub topics: i64,
	pub posts: i64,
	/// Author of the most recent post in any topic of the forum.
	pub last_poster: Option<String>,
	pub last_posted_at: Option<DateTime<Utc>>,
}

impl ForumSummary {
	pub async fn all<'c>(executor: impl SqliteExecutor<'c>) -> Result<Vec<Self>, sqlx::Error> {
		sqlx::query_as::<_, Self>(
			r#"
				SELECT
					forum.id,
					forum.name,
					forum.description,
					(SELECT COUNT(*) FROM topic WHERE topic.forum_id = forum.id) AS topics,
					(
						SELECT COUNT(*) FROM post
						JOIN topic ON topic.id = post.topic_id
						WHERE topic.forum_id = forum.id
					) AS posts,
					latest.username AS last_poster,
					latest.created_at AS last_posted_at
				FROM forum
				LEFT JOIN (
					SELECT
						topic.forum_id,
						"user".username,
						post.created_at,
						ROW_NUMBER() OVER (
							PARTITION BY topic.forum_id
							ORDER BY post.created_at DESC, post.id DESC
						) AS position
					FROM post
					JOIN topic ON topic.id = post.topic_id
					JOIN "user" ON "user".id = post.created_by
				) AS latest ON latest.forum_id = forum.id AND latest.position = 1
				ORDER BY forum.name
			"#,
		)
		.fetch_all(executor)
		.await
	}
}

/// A row of a forum's topic listing.
#[derive(Debug, sqlx::FromRow)]
pub struct TopicSummary {
	pub id: i64,
	pub subject: String,
	pub last_updated: DateTime<Utc>,
	pub views: i64,
	pub starter: String,
	/// Every post but the opening one.
	pub replies: i64,
}

impl TopicSummary {
	pub async fn count<'c>(
		executor: impl SqliteExecutor<'c>,
		forum_id: i64,
	) -> Result<i64, sqlx::Error> {
		sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM topic WHERE forum_id = $1")
			.bind(forum_id)
			.fetch_one(executor)
			.await
	}

	/// Most recently updated first.
	pub async fn list<'c>(
		executor: impl SqliteExecutor<'c>,
		forum_id: i64,
		limit: i64,
		offset: i64,
	) -> Result<Vec<Self>, sqlx::Error> {
		sqlx::query_as::<_, Self>(
			r#"
				SELECT
					topic.id,
					topic.subject,
					topic.last_updated,
					topic.views,
					"user".username AS starter,
					MAX(COUNT(post.id) - 1, 0) AS replies
				FROM topic
				JOIN "user" ON "user".id = topic.opener_id
				LEFT JOIN post ON post.topic_id = topic.id
				WHERE topic.forum_id = $1
				GROUP BY topic.id
				ORDER BY topic.last_updated DESC, topic.id DESC
				LIMIT $2 OFFSET $3
			"#,
		)
		.bind(forum_id)
		.bind(limit)
		.bind(offset)
		.fetch_all(executor)
		.await
	}
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct NewTopicForm {
	#[serde(default, deserialize_with = "trim")]
	#[validate(
		custom(function = "crate::form::required"),
		length(max = 255, message = "Ensure this value has at most 255 characters.")
	)]
	pub subject: String,
	#[serde(default, deserialize_with = "trim")]
	#[validate(
		custom(function = "crate::form::required"),
		length(max = 4000, message = "Ensure this value has at most 4000 characters.")
	)]
	pub message: String,
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_new_topic_form_limits() {
		let form = NewTopicForm {
			subject: "Hello, world!".into(),
			message: "Some random text".into(),
		};

		assert!(form.validate().is_ok());

		let form = NewTopicForm {
			subject: "x".repeat(256),
			message: String::new(),
		};

		let errors = form.validate().unwrap_err();

		assert!(errors.field_errors().contains_key("subject"));
		assert!(errors.field_errors().contains_key("message"));
	}
}
