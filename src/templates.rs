//! Askama templates for every page of the forum.

use askama::Template;
use axum::response::Html;
use uuid::Uuid;

use crate::{
	extract::{CsrfToken, Session},
	form::FormState,
	route::{
		auth::model::{LoginForm, SignupForm},
		forum::model::{Forum, ForumSummary, NewTopicForm, TopicSummary},
		model::Page,
		reset::model::PasswordResetForm,
		topic::model::{Post, PostForm, PostView, Topic},
	},
	Error,
};

pub const SITE_NAME: &str = "Forum";

/// Request-scoped values every page needs: who is logged in, and the token
/// that forms must echo back.
#[derive(Debug, Default)]
pub struct Context {
	pub user: Option<String>,
	pub csrf_token: String,
}

impl Context {
	pub fn new(session: Option<&Session>, csrf: CsrfToken) -> Self {
		Self {
			user: session.map(|session| session.user.username.clone()),
			csrf_token: csrf.0,
		}
	}

	pub fn anonymous() -> Self {
		Self::default()
	}
}

pub fn render(template: &impl Template) -> Result<Html<String>, Error> {
	Ok(Html(template.render()?))
}

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
	pub ctx: Context,
	pub forums: Vec<ForumSummary>,
}

#[derive(Template)]
#[template(path = "topics.html")]
pub struct TopicsTemplate {
	pub ctx: Context,
	pub forum: Forum,
	pub page: Page<TopicSummary>,
}

#[derive(Template)]
#[template(path = "new_topic.html")]
pub struct NewTopicTemplate {
	pub ctx: Context,
	pub forum: Forum,
	pub input: NewTopicForm,
	pub form: FormState,
}

#[derive(Template)]
#[template(path = "topic_posts.html")]
pub struct TopicPostsTemplate {
	pub ctx: Context,
	pub forum: Forum,
	pub topic: Topic,
	pub page: Page<PostView>,
}

#[derive(Template)]
#[template(path = "reply_topic.html")]
pub struct ReplyTemplate {
	pub ctx: Context,
	pub forum: Forum,
	pub topic: Topic,
	/// The latest posts, newest first, shown below the form for context.
	pub recent: Vec<PostView>,
	pub input: PostForm,
	pub form: FormState,
}

#[derive(Template)]
#[template(path = "edit_post.html")]
pub struct EditPostTemplate {
	pub ctx: Context,
	pub forum: Forum,
	pub topic: Topic,
	pub post: Post,
	pub input: PostForm,
	pub form: FormState,
}

#[derive(Template)]
#[template(path = "signup.html")]
pub struct SignupTemplate {
	pub ctx: Context,
	pub input: SignupForm,
	pub form: FormState,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
	pub ctx: Context,
	pub input: LoginForm,
	pub form: FormState,
}

#[derive(Template)]
#[template(path = "password_change.html")]
pub struct PasswordChangeTemplate {
	pub ctx: Context,
	pub form: FormState,
}

#[derive(Template)]
#[template(path = "password_change_done.html")]
pub struct PasswordChangeDoneTemplate {
	pub ctx: Context,
}

#[derive(Template)]
#[template(path = "password_reset.html")]
pub struct PasswordResetTemplate {
	pub ctx: Context,
	pub input: PasswordResetForm,
	pub form: FormState,
}

#[derive(Template)]
#[template(path = "password_reset_done.html")]
pub struct PasswordResetDoneTemplate {
	pub ctx: Context,
}

#[derive(Template)]
#[template(path = "password_reset_confirm.html")]
pub struct PasswordResetConfirmTemplate {
	pub ctx: Context,
	/// False when the link is unknown, expired or already used.
	pub valid_link: bool,
	pub form: FormState,
}

#[derive(Template)]
#[template(path = "password_reset_complete.html")]
pub struct PasswordResetCompleteTemplate {
	pub ctx: Context,
}

#[derive(Template)]
#[template(path = "password_reset_subject.txt")]
pub struct PasswordResetSubject {
	pub site: &'static str,
}

#[derive(Template)]
#[template(path = "password_reset_email.txt")]
pub struct PasswordResetEmail<'a> {
	pub site: &'static str,
	pub base_url: &'a str,
	pub uid: Uuid,
	pub token: Uuid,
	pub username: &'a str,
	pub email: &'a str,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
	pub ctx: Context,
	pub status: u16,
	pub reason: &'static str,
	pub detail: &'static str,
}
