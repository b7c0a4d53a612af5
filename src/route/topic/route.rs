use axum::{
	extract::{Path, Query, State},
	response::{Html, IntoResponse, Redirect, Response},
};
use chrono::Utc;

use crate::{
	extract::{CsrfForm, CsrfToken, Session},
	form::FormState,
	route::{
		forum::model::Forum,
		model::{PageInput, Paginator},
	},
	templates::{render, Context, EditPostTemplate, ReplyTemplate, TopicPostsTemplate},
	AppState, Error,
};

use super::model::{Post, PostForm, PostView, Topic};

/// How many of the latest posts are shown under the reply form.
const RECENT_POSTS: i64 = 10;

fn posts_url(forum_id: i64, topic_id: i64) -> String {
	format!("/forum/{forum_id}/topics/{topic_id}/")
}

/// Lists the posts of a topic, counting the visit.
pub async fn posts(
	State(state): State<AppState>,
	Path((id, topic_id)): Path<(i64, i64)>,
	Query(query): Query<PageInput>,
	session: Option<Session>,
	csrf: CsrfToken,
) -> Result<Html<String>, Error> {
	let forum = Forum::find(&state.database, id).await?;

	sqlx::query("UPDATE topic SET views = views + 1 WHERE id = $1 AND forum_id = $2")
		.bind(topic_id)
		.bind(forum.id)
		.execute(&state.database)
		.await?;

	let topic = Topic::find(&state.database, forum.id, topic_id).await?;

	let total = PostView::count(&state.database, topic.id).await?;
	let paginator = Paginator::new(total, state.config.posts_per_page);
	let number = paginator.number(query.page.as_deref());

	let mut posts = PostView::list(
		&state.database,
		topic.id,
		paginator.limit(),
		paginator.offset(number),
	)
	.await?;

	PostView::mark_editable(&mut posts, session.as_ref().map(|s| s.user.id));

	render(&TopicPostsTemplate {
		ctx: Context::new(session.as_ref(), csrf),
		forum,
		topic,
		page: paginator.page(number, posts),
	})
}

pub async fn reply_form(
	State(state): State<AppState>,
	Path((id, topic_id)): Path<(i64, i64)>,
	session: Session,
	csrf: CsrfToken,
) -> Result<Html<String>, Error> {
	let forum = Forum::find(&state.database, id).await?;
	let topic = Topic::find(&state.database, forum.id, topic_id).await?;
	let recent = PostView::recent(&state.database, topic.id, RECENT_POSTS).await?;

	render(&ReplyTemplate {
		ctx: Context::new(Some(&session), csrf),
		forum,
		topic,
		recent,
		input: PostForm::default(),
		form: FormState::unbound(),
	})
}

/// Appends a post to a topic and bumps it to the top of its forum.
pub async fn reply(
	State(state): State<AppState>,
	Path((id, topic_id)): Path<(i64, i64)>,
	session: Session,
	csrf: CsrfToken,
	CsrfForm(input): CsrfForm<PostForm>,
) -> Result<Response, Error> {
	let forum = Forum::find(&state.database, id).await?;
	let topic = Topic::find(&state.database, forum.id, topic_id).await?;
	let form = FormState::validate(&input);

	if !form.is_valid() {
		let recent = PostView::recent(&state.database, topic.id, RECENT_POSTS).await?;

		return Ok(render(&ReplyTemplate {
			ctx: Context::new(Some(&session), csrf),
			forum,
			topic,
			recent,
			input,
			form,
		})?
		.into_response());
	}

	let now = Utc::now();
	let mut tx = state.database.begin().await?;

	sqlx::query(
		r#"
			INSERT INTO post (message, topic_id, created_at, created_by)
			VALUES ($1, $2, $3, $4)
		"#,
	)
	.bind(&input.message)
	.bind(topic.id)
	.bind(now)
	.bind(session.user.id)
	.execute(&mut *tx)
	.await?;

	sqlx::query("UPDATE topic SET last_updated = $1 WHERE id = $2")
		.bind(now)
		.bind(topic.id)
		.execute(&mut *tx)
		.await?;

	tx.commit().await?;

	tracing::info!(topic = topic.id, user = %session.user.username, "reply posted");

	Ok(Redirect::to(&posts_url(forum.id, topic.id)).into_response())
}

pub async fn edit_form(
	State(state): State<AppState>,
	Path((id, topic_id, post_id)): Path<(i64, i64, i64)>,
	session: Session,
	csrf: CsrfToken,
) -> Result<Html<String>, Error> {
	let forum = Forum::find(&state.database, id).await?;
	let topic = Topic::find(&state.database, forum.id, topic_id).await?;
	let post = Post::find_own(&state.database, &topic, post_id, session.user.id).await?;

	render(&EditPostTemplate {
		ctx: Context::new(Some(&session), csrf),
		input: PostForm {
			message: post.message.clone(),
		},
		forum,
		topic,
		post,
		form: FormState::unbound(),
	})
}

/// Replaces the message of a post written by the current user.
///
/// Concurrent edits are not detected, the last one to commit wins.
pub async fn edit(
	State(state): State<AppState>,
	Path((id, topic_id, post_id)): Path<(i64, i64, i64)>,
	session: Session,
	csrf: CsrfToken,
	CsrfForm(input): CsrfForm<PostForm>,
) -> Result<Response, Error> {
	let forum = Forum::find(&state.database, id).await?;
	let topic = Topic::find(&state.database, forum.id, topic_id).await?;
	let post = Post::find_own(&state.database, &topic, post_id, session.user.id).await?;
	let form = FormState::validate(&input);

	if !form.is_valid() {
		return Ok(render(&EditPostTemplate {
			ctx: Context::new(Some(&session), csrf),
			forum,
			topic,
			post,
			input,
			form,
		})?
		.into_response());
	}

	let updated = sqlx::query(
		r#"
			UPDATE post SET message = $1, updated_by = $2, updated_at = $3
			WHERE id = $4 AND created_by = $2
		"#,
	)
	.bind(&input.message)
	.bind(session.user.id)
	.bind(Utc::now())
	.bind(post.id)
	.execute(&state.database)
	.await?;

	if updated.rows_affected() == 0 {
		return Err(super::Error::UnknownPost(post.id).into());
	}

	tracing::info!(post = post.id, user = %session.user.username, "post edited");

	Ok(Redirect::to(&posts_url(forum.id, topic.id)).into_response())
}
