#![warn(clippy::pedantic)]

mod config;
mod csrf;
mod error;
mod extract;
mod form;
mod mail;
mod route;
mod session;
mod templates;

use std::sync::Arc;

use argon2::Argon2;
use axum::{middleware, Router};
use clap::{Parser, Subcommand};
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceBuilder;
use tower_http::{
	compression::CompressionLayer,
	request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
	trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use mail::{FileMailer, LogMailer, Mailer};
use route::forum::model::Forum;

pub use error::Error;

pub type Database = sqlx::Pool<sqlx::Sqlite>;
pub type AppState = State;

/// The shared application state.
///
/// This should contain all shared dependencies that handlers need to access,
/// such as a database connection pool, a hash configuration (if it's expensive to create),
/// or the outgoing mail backend.
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub database: Database,
	pub hasher: Argon2<'static>,
	pub config: Arc<Config>,
	pub mailer: Arc<dyn Mailer>,
}

/// Builds the full application router.
pub fn app(state: State) -> Router {
	Router::new()
		.merge(route::forum::routes())
		.merge(route::topic::routes())
		.merge(route::auth::routes())
		.merge(route::reset::routes())
		.layer(middleware::from_fn_with_state(state.clone(), csrf::issue))
		.layer(
			ServiceBuilder::new()
				.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
				.layer(TraceLayer::new_for_http())
				.layer(PropagateRequestIdLayer::x_request_id())
				.layer(CompressionLayer::new()),
		)
		.with_state(state)
}

/// A web forum.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Serves the site (the default).
	Serve,
	/// Adds a new forum.
	CreateForum { name: String, description: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	dotenvy::dotenv().ok();

	tracing_subscriber::registry()
		.with(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,tower_http=debug".into()),
		)
		.with(tracing_subscriber::fmt::layer().with_ansi(true))
		.init();

	let config = Config::from_env()?;

	let database = SqlitePoolOptions::new()
		.connect(&config.database_url)
		.await?;

	sqlx::migrate!().run(&database).await?;

	match args.command.unwrap_or(Command::Serve) {
		Command::Serve => serve(database, config).await,
		Command::CreateForum { name, description } => {
			let forum = Forum::create(&database, &name, &description).await?;

			tracing::info!(id = forum.id, name = %forum.name, "forum created");
			println!("created forum {} ({})", forum.name, forum.id);

			Ok(())
		}
	}
}

async fn serve(database: Database, config: Config) -> Result<(), Box<dyn std::error::Error>> {
	let mailer: Arc<dyn Mailer> = match &config.mail_dir {
		Some(dir) => Arc::new(FileMailer::new(dir.clone())),
		None => Arc::new(LogMailer),
	};

	let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;

	tracing::info!("listening on {}", listener.local_addr()?);

	let state = State {
		database,
		hasher: Argon2::default(),
		config: Arc::new(config),
		mailer,
	};

	axum::serve(listener, app(state)).await?;

	Ok(())
}
