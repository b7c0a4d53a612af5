use std::path::PathBuf;

use chrono::Utc;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("failed to write message: {0}")]
	Io(#[from] std::io::Error),
}

/// A plain-text e-mail.
#[derive(Debug, Clone)]
pub struct Message {
	pub to: String,
	pub subject: String,
	pub body: String,
}

impl Message {
	fn to_rfc822(&self) -> String {
		format!(
			"To: {}\r\nSubject: {}\r\nDate: {}\r\nContent-Type: text/plain; charset=utf-8\r\n\r\n{}",
			self.to,
			self.subject,
			Utc::now().to_rfc2822(),
			self.body
		)
	}
}

/// Delivers outgoing mail.
#[axum::async_trait]
pub trait Mailer: Send + Sync {
	async fn send(&self, message: Message) -> Result<(), Error>;
}

/// Writes every message to the log instead of delivering it.
#[derive(Debug, Default)]
pub struct LogMailer;

#[axum::async_trait]
impl Mailer for LogMailer {
	async fn send(&self, message: Message) -> Result<(), Error> {
		tracing::info!(
			to = %message.to,
			subject = %message.subject,
			body = %message.body,
			"outgoing mail"
		);

		Ok(())
	}
}

/// Writes every message as a separate `.eml` file in a directory.
#[derive(Debug)]
pub struct FileMailer {
	dir: PathBuf,
}

impl FileMailer {
	pub fn new(dir: PathBuf) -> Self {
		Self { dir }
	}
}

#[axum::async_trait]
impl Mailer for FileMailer {
	async fn send(&self, message: Message) -> Result<(), Error> {
		tokio::fs::create_dir_all(&self.dir).await?;

		let path = self.dir.join(format!(
			"{}-{}.eml",
			Utc::now().format("%Y%m%d-%H%M%S"),
			Uuid::new_v4().simple()
		));

		tokio::fs::write(&path, message.to_rfc822()).await?;
		tracing::debug!(path = %path.display(), to = %message.to, "mail written");

		Ok(())
	}
}

/// Keeps every message in memory so tests can inspect what was sent.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryMailer {
	outbox: std::sync::Mutex<Vec<Message>>,
}

#[cfg(test)]
impl MemoryMailer {
	pub fn outbox(&self) -> Vec<Message> {
		self.outbox.lock().unwrap().clone()
	}
}

#[cfg(test)]
#[axum::async_trait]
impl Mailer for MemoryMailer {
	async fn send(&self, message: Message) -> Result<(), Error> {
		self.outbox.lock().unwrap().push(message);
		Ok(())
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn message() -> Message {
		Message {
			to: "john@doe.com".into(),
			subject: "Hello".into(),
			body: "Some random text".into(),
		}
	}

	#[tokio::test]
	async fn test_file_mailer_writes_message() {
		let dir = std::env::temp_dir().join(format!("forum-mail-{}", Uuid::new_v4().simple()));
		let mailer = FileMailer::new(dir.clone());

		mailer.send(message()).await.unwrap();

		let mut entries = std::fs::read_dir(&dir).unwrap();
		let entry = entries.next().unwrap().unwrap();
		let content = std::fs::read_to_string(entry.path()).unwrap();

		assert!(content.starts_with("To: john@doe.com\r\nSubject: Hello\r\n"));
		assert!(content.ends_with("\r\n\r\nSome random text"));

		std::fs::remove_dir_all(dir).unwrap();
	}

	#[tokio::test]
	async fn test_memory_mailer_keeps_messages() {
		let mailer = MemoryMailer::default();

		mailer.send(message()).await.unwrap();

		assert_eq!(mailer.outbox().len(), 1);
		assert_eq!(mailer.outbox()[0].subject, "Hello");
	}
}
