use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::SqliteExecutor;
use uuid::Uuid;
use validator::Validate;

use crate::form::trim;

use super::Error;

/// A discussion thread within a forum.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Topic {
	pub id: i64,
	pub subject: String,
	pub last_updated: DateTime<Utc>,
	pub views: i64,
	pub forum_id: i64,
	pub opener_id: Uuid,
}

impl Topic {
	/// Fetches a topic, but only through the forum it belongs to.
	pub async fn find<'c>(
		executor: impl SqliteExecutor<'c>,
		forum_id: i64,
		id: i64,
	) -> Result<Self, crate::Error> {
		sqlx::query_as::<_, Self>("SELECT * FROM topic WHERE id = $1 AND forum_id = $2")
			.bind(id)
			.bind(forum_id)
			.fetch_optional(executor)
			.await?
			.ok_or_else(|| Error::UnknownTopic(id).into())
	}
}

/// A single message, as stored.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Post {
	pub id: i64,
	pub message: String,
	pub topic_id: i64,
	pub created_at: DateTime<Utc>,
	pub updated_at: Option<DateTime<Utc>>,
	pub created_by: Uuid,
	pub updated_by: Option<Uuid>,
}

impl Post {
	/// Fetches a post that `author` wrote in the given topic.
	///
	/// Posts of other users are reported as missing, so nobody can probe
	/// which ids exist.
	pub async fn find_own<'c>(
		executor: impl SqliteExecutor<'c>,
		topic: &Topic,
		id: i64,
		author: Uuid,
	) -> Result<Self, crate::Error> {
		sqlx::query_as::<_, Self>(
			r#"
				SELECT post.* FROM post
				JOIN topic ON topic.id = post.topic_id
				WHERE post.id = $1 AND post.topic_id = $2 AND topic.forum_id = $3 AND post.created_by = $4
			"#,
		)
		.bind(id)
		.bind(topic.id)
		.bind(topic.forum_id)
		.bind(author)
		.fetch_optional(executor)
		.await?
		.ok_or_else(|| Error::UnknownPost(id).into())
	}
}

const SELECT_VIEW: &str = r#"
	SELECT
		post.id,
		post.message,
		post.created_at,
		post.updated_at,
		post.created_by,
		author.username AS author,
		(SELECT COUNT(*) FROM post AS authored WHERE authored.created_by = post.created_by) AS author_posts,
		editor.username AS editor
	FROM post
	JOIN "user" AS author ON author.id = post.created_by
	LEFT JOIN "user" AS editor ON editor.id = post.updated_by
	WHERE post.topic_id = $1
"#;

/// A post as shown in a topic, with its author's details.
#[derive(Debug, sqlx::FromRow)]
pub struct PostView {
	pub id: i64,
	pub message: String,
	pub created_at: DateTime<Utc>,
	pub updated_at: Option<DateTime<Utc>>,
	pub created_by: Uuid,
	pub author: String,
	/// Total number of posts by the author, across all forums.
	pub author_posts: i64,
	pub editor: Option<String>,
	/// Whether the viewer wrote this post and may edit it.
	#[sqlx(skip)]
	pub editable: bool,
}

impl PostView {
	pub async fn count<'c>(
		executor: impl SqliteExecutor<'c>,
		topic_id: i64,
	) -> Result<i64, sqlx::Error> {
		sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM post WHERE topic_id = $1")
			.bind(topic_id)
			.fetch_one(executor)
			.await
	}

	/// Oldest first.
	pub async fn list<'c>(
		executor: impl SqliteExecutor<'c>,
		topic_id: i64,
		limit: i64,
		offset: i64,
	) -> Result<Vec<Self>, sqlx::Error> {
		let sql = format!("{SELECT_VIEW} ORDER BY post.created_at, post.id LIMIT $2 OFFSET $3");

		sqlx::query_as::<_, Self>(&sql)
			.bind(topic_id)
			.bind(limit)
			.bind(offset)
			.fetch_all(executor)
			.await
	}

	/// Newest first.
	pub async fn recent<'c>(
		executor: impl SqliteExecutor<'c>,
		topic_id: i64,
		limit: i64,
	) -> Result<Vec<Self>, sqlx::Error> {
		let sql = format!("{SELECT_VIEW} ORDER BY post.created_at DESC, post.id DESC LIMIT $2");

		sqlx::query_as::<_, Self>(&sql)
			.bind(topic_id)
			.bind(limit)
			.fetch_all(executor)
			.await
	}

	/// Marks the posts that `viewer` is allowed to edit.
	pub fn mark_editable(posts: &mut [Self], viewer: Option<Uuid>) {
		for post in posts {
			post.editable = viewer == Some(post.created_by);
		}
	}
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct PostForm {
	#[serde(default, deserialize_with = "trim")]
	#[validate(
		custom(function = "crate::form::required"),
		length(max = 4000, message = "Ensure this value has at most 4000 characters.")
	)]
	pub message: String,
}
