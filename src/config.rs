use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use chrono::Duration;

/// Process configuration, read once at startup.
///
/// Every value comes from an environment variable (optionally loaded from
/// a `.env` file) and falls back to a default suitable for local development.
#[derive(Debug, Clone)]
pub struct Config {
	pub database_url: String,
	pub host: String,
	pub port: u16,
	/// Absolute origin used when building links that leave the site, such as
	/// the password reset e-mail.
	pub base_url: String,
	pub topics_per_page: i64,
	pub posts_per_page: i64,
	pub password_reset_timeout: Duration,
	/// When set, outgoing mail is written to this directory instead of the log.
	pub mail_dir: Option<PathBuf>,
	pub secure_cookies: bool,
}

const RESET_TIMEOUT_SECS: i64 = 60 * 60 * 24 * 3;

/// An environment variable held a value that could not be parsed.
#[derive(Debug, thiserror::Error)]
#[error("invalid value for {key}: {message}")]
pub struct Error {
	key: &'static str,
	message: String,
}

impl Config {
	pub fn from_env() -> Result<Self, Error> {
		let port = load("PORT", 3000)?;

		Ok(Self {
			database_url: env::var("DATABASE_URL")
				.unwrap_or_else(|_| "sqlite://forum.db?mode=rwc".into()),
			host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into()),
			port,
			base_url: env::var("BASE_URL").unwrap_or_else(|_| format!("http://127.0.0.1:{port}")),
			topics_per_page: load("TOPICS_PER_PAGE", 20)?,
			posts_per_page: load("POSTS_PER_PAGE", 10)?,
			password_reset_timeout: Duration::try_seconds(load(
				"PASSWORD_RESET_TIMEOUT_SECS",
				RESET_TIMEOUT_SECS,
			)?)
			.ok_or(Error {
				key: "PASSWORD_RESET_TIMEOUT_SECS",
				message: "out of range".into(),
			})?,
			mail_dir: env::var_os("MAIL_DIR").map(PathBuf::from),
			secure_cookies: load("SECURE_COOKIES", !cfg!(debug_assertions))?,
		})
	}
}

impl Default for Config {
	fn default() -> Self {
		Self {
			database_url: "sqlite::memory:".into(),
			host: "127.0.0.1".into(),
			port: 3000,
			base_url: "http://127.0.0.1:3000".into(),
			topics_per_page: 20,
			posts_per_page: 10,
			password_reset_timeout: Duration::days(3),
			mail_dir: None,
			secure_cookies: false,
		}
	}
}

fn load<T>(key: &'static str, default: T) -> Result<T, Error>
where
	T: FromStr + Display,
	T::Err: Display,
{
	match env::var(key) {
		Ok(value) => value.trim().parse().map_err(|e: T::Err| Error {
			key,
			message: e.to_string(),
		}),
		Err(_) => {
			tracing::debug!("{key} not set, using default: {default}");
			Ok(default)
		}
	}
}
