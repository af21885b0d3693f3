//! Scope modeling helpers for token requests.

// std
use std::{collections::BTreeSet, slice::Iter};
// crates.io
use serde::{Deserializer, Serializer, de::Error as DeError, ser::SerializeSeq};
// self
use crate::_prelude::*;

/// Errors emitted when validating scopes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ScopeValidationError {
	/// Empty scope entries are not allowed.
	#[error("Scope entries cannot be empty.")]
	Empty,
	/// Scopes cannot contain embedded whitespace characters.
	#[error("Scope contains whitespace: {scope}.")]
	ContainsWhitespace {
		/// The offending scope string.
		scope: String,
	},
}

/// Normalized set of OAuth capability scopes.
///
/// Scopes are deduplicated and sorted so equality and the joined request value stay stable
/// regardless of the order they were configured in.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeSet {
	scopes: Arc<[String]>,
}
impl ScopeSet {
	/// Scope required to read translated viewables from the model derivative service.
	pub const VIEWABLES_READ: &'static str = "viewables:read";

	/// Creates a normalized scope set from any iterator.
	pub fn new<I, S>(scopes: I) -> Result<Self, ScopeValidationError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Ok(Self { scopes: normalize(scopes)? })
	}

	/// Read-only viewing scope used when nothing else is configured.
	pub fn viewables_read() -> Self {
		Self { scopes: Arc::from(vec![Self::VIEWABLES_READ.to_owned()]) }
	}

	/// Number of distinct scopes.
	pub fn len(&self) -> usize {
		self.scopes.len()
	}

	/// Returns true if no scopes are defined.
	pub fn is_empty(&self) -> bool {
		self.scopes.is_empty()
	}

	/// Returns true if the normalized set contains the provided scope.
	pub fn contains(&self, scope: &str) -> bool {
		self.scopes.binary_search_by(|candidate| candidate.as_str().cmp(scope)).is_ok()
	}

	/// Iterator over normalized scopes.
	pub fn iter(&self) -> ScopeIter<'_> {
		ScopeIter { inner: self.scopes.iter() }
	}

	/// Joins the scopes with `delimiter` for the `scope` form field.
	pub fn join(&self, delimiter: char) -> String {
		let mut buf = String::new();

		for (idx, value) in self.scopes.iter().enumerate() {
			if idx > 0 {
				buf.push(delimiter);
			}

			buf.push_str(value);
		}

		buf
	}

	/// Returns the normalized string representation (space-delimited).
	pub fn normalized(&self) -> String {
		self.join(' ')
	}
}
impl Debug for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("ScopeSet").field(&self.scopes).finish()
	}
}
impl Display for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.normalized())
	}
}
impl FromStr for ScopeSet {
	type Err = ScopeValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s.is_empty() {
			return Ok(Self::default());
		}
		if s.chars().all(char::is_whitespace) {
			return Err(ScopeValidationError::Empty);
		}

		Self::new(s.split_whitespace())
	}
}
impl<'a> IntoIterator for &'a ScopeSet {
	type IntoIter = ScopeIter<'a>;
	type Item = &'a str;

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}
impl Serialize for ScopeSet {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut seq = serializer.serialize_seq(Some(self.scopes.len()))?;

		for scope in self.scopes.iter() {
			seq.serialize_element(scope)?;
		}

		seq.end()
	}
}
impl<'de> Deserialize<'de> for ScopeSet {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let values = <Vec<String>>::deserialize(deserializer)?;

		ScopeSet::new(values).map_err(DeError::custom)
	}
}

/// Iterator over scope strings.
pub struct ScopeIter<'a> {
	inner: Iter<'a, String>,
}
impl<'a> Iterator for ScopeIter<'a> {
	type Item = &'a str;

	fn next(&mut self) -> Option<Self::Item> {
		self.inner.next().map(|s| s.as_str())
	}
}

fn normalize<I, S>(scopes: I) -> Result<Arc<[String]>, ScopeValidationError>
where
	I: IntoIterator<Item = S>,
	S: Into<String>,
{
	let mut set = BTreeSet::new();

	for scope in scopes {
		let owned: String = scope.into();

		if owned.is_empty() {
			return Err(ScopeValidationError::Empty);
		}
		if owned.chars().any(char::is_whitespace) {
			return Err(ScopeValidationError::ContainsWhitespace { scope: owned });
		}

		set.insert(owned);
	}

	Ok(Arc::from(set.into_iter().collect::<Vec<_>>()))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn scopes_normalize_and_deduplicate() {
		let lhs = ScopeSet::new(["data:write", "data:read", "data:read"])
			.expect("Left-hand scope set should be valid.");
		let rhs = ScopeSet::from_str("data:read data:write")
			.expect("Right-hand scope set should parse successfully.");

		assert_eq!(lhs, rhs);
		assert_eq!(lhs.normalized(), "data:read data:write");
		assert_eq!(lhs.join(','), "data:read,data:write");
	}

	#[test]
	fn scopes_reject_whitespace_padding() {
		let err = ScopeSet::new([" viewables:read "]).expect_err("Padded scopes must be rejected.");

		assert!(matches!(err, ScopeValidationError::ContainsWhitespace { .. }));
		assert!(ScopeSet::new([""]).is_err());
		assert!(ScopeSet::from_str("").is_ok(), "Empty string represents an empty scope set.");
		assert!(ScopeSet::from_str("   ").is_err(), "Whitespace-only input must be rejected.");
	}

	#[test]
	fn default_viewing_scope_is_read_only() {
		let scope = ScopeSet::viewables_read();

		assert_eq!(scope.len(), 1);
		assert!(scope.contains("viewables:read"));
		assert!(!scope.contains("data:write"));
		assert_eq!(scope.iter().collect::<Vec<_>>(), vec!["viewables:read"]);
	}

	#[test]
	fn serde_validates_entries() {
		let scope: ScopeSet = serde_json::from_str("[\"bucket:read\",\"data:read\"]")
			.expect("Scope list should deserialize.");

		assert_eq!(scope.to_string(), "bucket:read data:read");
		assert!(serde_json::from_str::<ScopeSet>("[\"has space\"]").is_err());
	}
}
