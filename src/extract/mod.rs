mod session;

pub use session::Session;

pub use crate::csrf::{CsrfForm, CsrfToken};
