use axum::{http::StatusCode, routing::get, Router};

use crate::AppState;

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown topic {0}")]
	UnknownTopic(i64),
	#[error("unknown post {0}")]
	UnknownPost(i64),
}

impl Error {
	pub fn status(&self) -> StatusCode {
		match self {
			Self::UnknownTopic(..) | Self::UnknownPost(..) => StatusCode::NOT_FOUND,
		}
	}
}

pub fn routes() -> Router<AppState> {
	use route::*;

	Router::new()
		.route("/forum/:id/topics/:topic_id/", get(posts))
		.route("/forum/:id/topics/:topic_id/reply/", get(reply_form).post(reply))
		.route(
			"/forum/:id/topics/:topic_id/posts/:post_id/edit/",
			get(edit_form).post(edit),
		)
}
