use axum::{
	extract::{Path, Query, State},
	response::{Html, IntoResponse, Redirect, Response},
};
use chrono::Utc;

use crate::{
	extract::{CsrfForm, CsrfToken, Session},
	form::FormState,
	route::model::{PageInput, Paginator},
	templates::{render, Context, HomeTemplate, NewTopicTemplate, TopicsTemplate},
	AppState, Database, Error,
};

use super::model::{self, Forum, ForumSummary, TopicSummary};

pub async fn home(
	State(database): State<Database>,
	session: Option<Session>,
	csrf: CsrfToken,
) -> Result<Html<String>, Error> {
	let forums = ForumSummary::all(&database).await?;

	render(&HomeTemplate {
		ctx: Context::new(session.as_ref(), csrf),
		forums,
	})
}

pub async fn topics(
	State(state): State<AppState>,
	Path(id): Path<i64>,
	Query(query): Query<PageInput>,
	session: Option<Session>,
	csrf: CsrfToken,
) -> Result<Html<String>, Error> {
	let forum = Forum::find(&state.database, id).await?;

	let total = TopicSummary::count(&state.database, forum.id).await?;
	let paginator = Paginator::new(total, state.config.topics_per_page);
	let number = paginator.number(query.page.as_deref());

	let topics = TopicSummary::list(
		&state.database,
		forum.id,
		paginator.limit(),
		paginator.offset(number),
	)
	.await?;

	render(&TopicsTemplate {
		ctx: Context::new(session.as_ref(), csrf),
		forum,
		page: paginator.page(number, topics),
	})
}

pub async fn new_topic_form(
	State(database): State<Database>,
	Path(id): Path<i64>,
	session: Session,
	csrf: CsrfToken,
) -> Result<Html<String>, Error> {
	let forum = Forum::find(&database, id).await?;

	render(&NewTopicTemplate {
		ctx: Context::new(Some(&session), csrf),
		forum,
		input: model::NewTopicForm::default(),
		form: FormState::unbound(),
	})
}

/// Opens a topic together with its first post.
pub async fn new_topic(
	State(database): State<Database>,
	Path(id): Path<i64>,
	session: Session,
	csrf: CsrfToken,
	CsrfForm(input): CsrfForm<model::NewTopicForm>,
) -> Result<Response, Error> {
	let forum = Forum::find(&database, id).await?;
	let form = FormState::validate(&input);

	if !form.is_valid() {
		return Ok(render(&NewTopicTemplate {
			ctx: Context::new(Some(&session), csrf),
			forum,
			input,
			form,
		})?
		.into_response());
	}

	let now = Utc::now();
	let mut tx = database.begin().await?;

	let topic_id = sqlx::query(
		r#"
			INSERT INTO topic (subject, last_updated, forum_id, opener_id)
			VALUES ($1, $2, $3, $4)
		"#,
	)
	.bind(&input.subject)
	.bind(now)
	.bind(forum.id)
	.bind(session.user.id)
	.execute(&mut *tx)
	.await?
	.last_insert_rowid();

	sqlx::query(
		r#"
			INSERT INTO post (message, topic_id, created_at, created_by)
			VALUES ($1, $2, $3, $4)
		"#,
	)
	.bind(&input.message)
	.bind(topic_id)
	.bind(now)
	.bind(session.user.id)
	.execute(&mut *tx)
	.await?;

	tx.commit().await?;

	tracing::info!(
		forum = forum.id,
		topic = topic_id,
		user = %session.user.username,
		"topic opened"
	);

	Ok(Redirect::to(&format!("/forum/{}/topics/{topic_id}/", forum.id)).into_response())
}
