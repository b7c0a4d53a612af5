use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use validator::{Validate, ValidateEmail, ValidationError, ValidationErrors};

/// Key under which errors that belong to no single field are stored.
pub const NON_FIELD_ERRORS: &str = "__all__";

pub const REQUIRED: &str = "This field is required.";

/// Submission state of a form, used to re-render it with per-field errors.
///
/// An unbound form has never been submitted, so none of its inputs are
/// marked valid or invalid.
#[derive(Debug, Default)]
pub struct FormState {
	bound: bool,
	errors: BTreeMap<String, Vec<String>>,
}

impl FormState {
	pub fn unbound() -> Self {
		Self::default()
	}

	/// Runs the derived validators of a submitted form.
	pub fn validate<T: Validate>(input: &T) -> Self {
		let mut state = Self {
			bound: true,
			errors: BTreeMap::new(),
		};

		if let Err(errors) = input.validate() {
			state.extend(&errors);
		}

		state
	}

	fn extend(&mut self, errors: &ValidationErrors) {
		for (field, errors) in errors.field_errors() {
			self.errors
				.entry(field.to_string())
				.or_default()
				.extend(errors.iter().map(message));
		}
	}

	/// Records an error found outside the derived validators, such as a
	/// uniqueness check against the database.
	pub fn add(&mut self, field: &str, message: impl Into<String>) {
		self.bound = true;
		self.errors
			.entry(field.to_owned())
			.or_default()
			.push(message.into());
	}

	pub fn is_valid(&self) -> bool {
		self.bound && self.errors.is_empty()
	}

	pub fn has_error(&self, field: &str) -> bool {
		self.errors.contains_key(field)
	}

	pub fn errors(&self, field: &str) -> &[String] {
		self.errors.get(field).map_or(&[][..], Vec::as_slice)
	}

	pub fn non_field_errors(&self) -> &[String] {
		self.errors(NON_FIELD_ERRORS)
	}

	/// Bootstrap classes for a plain input.
	pub fn input_class(&self, field: &str) -> &'static str {
		if !self.bound {
			"form-control "
		} else if self.has_error(field) {
			"form-control is-invalid"
		} else {
			"form-control is-valid"
		}
	}

	/// Bootstrap classes for a secret input, which is never shown as valid
	/// since its value is not echoed back.
	pub fn secret_input_class(&self, field: &str) -> &'static str {
		if self.bound && self.has_error(field) {
			"form-control is-invalid"
		} else {
			"form-control "
		}
	}
}

fn message(error: &ValidationError) -> String {
	error
		.message
		.as_ref()
		.map_or_else(|| error.code.to_string(), ToString::to_string)
}

/// Deserializes a text field with surrounding whitespace removed.
pub fn trim<'de, D>(deserializer: D) -> Result<String, D::Error>
where
	D: Deserializer<'de>,
{
	String::deserialize(deserializer).map(|value| value.trim().to_owned())
}

pub fn invalid(code: &'static str, message: &'static str) -> ValidationError {
	let mut error = ValidationError::new(code);
	error.message = Some(message.into());
	error
}

pub fn required(value: &str) -> Result<(), ValidationError> {
	if value.is_empty() {
		Err(invalid("required", REQUIRED))
	} else {
		Ok(())
	}
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
	required(email)?;

	if email.to_owned().validate_email() {
		Ok(())
	} else {
		Err(invalid("email", "Enter a valid email address."))
	}
}

/// Rejects passwords that are too short or entirely numeric.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
	required(password)?;

	if password.chars().count() < 8 {
		return Err(invalid(
			"password_too_short",
			"This password is too short. It must contain at least 8 characters.",
		));
	}

	if password.chars().all(|c| c.is_ascii_digit()) {
		return Err(invalid(
			"password_entirely_numeric",
			"This password is entirely numeric.",
		));
	}

	Ok(())
}
