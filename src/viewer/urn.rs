// crates.io
use base64::{
	Engine as _,
	engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
};
// self
use crate::_prelude::*;

const URN_PREFIX: &str = "urn:";

/// Errors raised when a document identifier cannot be used.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum DocumentUrnError {
	/// The identifier was empty (after removing any `urn:` prefix).
	#[error("Document identifier cannot be empty.")]
	Empty,
	/// The identifier contains a character outside the base64 alphabets.
	#[error("Document identifier contains an invalid character: {character:?}.")]
	InvalidCharacter {
		/// The offending character.
		character: char,
	},
	/// The identifier does not decode to a UTF-8 object id.
	#[error("Document identifier is not a base64-encoded object id.")]
	Undecodable,
}

/// Base64-encoded storage object id identifying a translated document.
///
/// Both the URL-safe alphabet the platform emits and the standard alphabet produced by
/// command-line tools are accepted. The value is stored without the `urn:` prefix;
/// [`viewer_document_id`](Self::viewer_document_id) adds it back for the runtime.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentUrn(String);
impl DocumentUrn {
	/// Parses an encoded identifier, with or without the `urn:` prefix.
	pub fn new(value: impl AsRef<str>) -> Result<Self, DocumentUrnError> {
		let view = value.as_ref();
		let encoded = view.strip_prefix(URN_PREFIX).unwrap_or(view);

		if encoded.is_empty() {
			return Err(DocumentUrnError::Empty);
		}
		let body = encoded.trim_end_matches('=');

		if body.is_empty() {
			return Err(DocumentUrnError::Empty);
		}
		if encoded.len() - body.len() > 2 {
			return Err(DocumentUrnError::InvalidCharacter { character: '=' });
		}
		if let Some(character) = body.chars().find(|ch| !is_base64_char(*ch)) {
			return Err(DocumentUrnError::InvalidCharacter { character });
		}

		Ok(Self(encoded.to_owned()))
	}

	/// Encodes a raw storage object id (for example
	/// `urn:adsk.objects:os.object:bucket/model.rvt`) as an unpadded URL-safe identifier.
	pub fn from_object_id(object_id: &str) -> Result<Self, DocumentUrnError> {
		if object_id.is_empty() {
			return Err(DocumentUrnError::Empty);
		}

		Ok(Self(URL_SAFE_NO_PAD.encode(object_id)))
	}

	/// Encoded identifier without the `urn:` prefix.
	pub fn encoded(&self) -> &str {
		&self.0
	}

	/// Identifier in the form the viewer runtime expects (`urn:<encoded>`).
	pub fn viewer_document_id(&self) -> String {
		format!("{URN_PREFIX}{}", self.0)
	}

	/// Decodes the underlying storage object id.
	pub fn object_id(&self) -> Result<String, DocumentUrnError> {
		let trimmed = self.0.trim_end_matches('=');
		let bytes = if trimmed.contains(['+', '/']) {
			STANDARD.decode(pad(trimmed))
		} else {
			URL_SAFE_NO_PAD.decode(trimmed)
		}
		.map_err(|_| DocumentUrnError::Undecodable)?;

		String::from_utf8(bytes).map_err(|_| DocumentUrnError::Undecodable)
	}
}
impl Debug for DocumentUrn {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "DocumentUrn({})", self.0)
	}
}
impl Display for DocumentUrn {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.viewer_document_id())
	}
}
impl FromStr for DocumentUrn {
	type Err = DocumentUrnError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}
impl TryFrom<String> for DocumentUrn {
	type Error = DocumentUrnError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
impl From<DocumentUrn> for String {
	fn from(value: DocumentUrn) -> Self {
		value.0
	}
}

fn is_base64_char(ch: char) -> bool {
	ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '+' | '/')
}

fn pad(trimmed: &str) -> String {
	let mut padded = trimmed.to_owned();

	while padded.len() % 4 != 0 {
		padded.push('=');
	}

	padded
}
