//! Strongly typed client identifier.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

const IDENTIFIER_MAX_LEN: usize = 128;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("Client identifier cannot be empty.")]
	Empty,
	/// The identifier contains whitespace characters.
	#[error("Client identifier contains whitespace.")]
	ContainsWhitespace,
	/// The identifier exceeded the allowed character count.
	#[error("Client identifier exceeds {max} characters.")]
	TooLong {
		/// Maximum permitted character count.
		max: usize,
	},
}

/// Public identifier of an APS application credential.
///
/// Unlike the client secret, the identifier is not sensitive and renders verbatim.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClientId(String);
impl ClientId {
	/// Creates a new identifier after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
		let view = value.as_ref();

		validate_view(view)?;

		Ok(Self(view.to_owned()))
	}
}
impl Deref for ClientId {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for ClientId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Borrow<str> for ClientId {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl From<ClientId> for String {
	fn from(value: ClientId) -> Self {
		value.0
	}
}
impl TryFrom<String> for ClientId {
	type Error = IdentifierError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		validate_view(&value)?;

		Ok(Self(value))
	}
}
impl Debug for ClientId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "ClientId({})", self.0)
	}
}
impl Display for ClientId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
impl FromStr for ClientId {
	type Err = IdentifierError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}

fn validate_view(view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty);
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace);
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn identifiers_reject_padding_and_empty_values() {
		assert_eq!(ClientId::new(" abc"), Err(IdentifierError::ContainsWhitespace));
		assert_eq!(ClientId::new("abc\t"), Err(IdentifierError::ContainsWhitespace));
		assert_eq!(ClientId::new(""), Err(IdentifierError::Empty));

		let id = ClientId::new("Xy7Q9tYcLZ").expect("Client identifier fixture should be valid.");

		assert_eq!(id.as_ref(), "Xy7Q9tYcLZ");
		assert_eq!(format!("{id:?}"), "ClientId(Xy7Q9tYcLZ)");
	}

	#[test]
	fn serde_enforces_validation() {
		let id: ClientId = serde_json::from_str("\"client-42\"")
			.expect("Client identifier should deserialize successfully.");

		assert_eq!(&*id, "client-42");
		assert!(serde_json::from_str::<ClientId>("\"with space\"").is_err());
	}

	#[test]
	fn length_limit_is_inclusive() {
		ClientId::new("a".repeat(IDENTIFIER_MAX_LEN)).expect("Exact length should succeed.");

		assert_eq!(
			ClientId::new("a".repeat(IDENTIFIER_MAX_LEN + 1)),
			Err(IdentifierError::TooLong { max: IDENTIFIER_MAX_LEN })
		);
	}
}
