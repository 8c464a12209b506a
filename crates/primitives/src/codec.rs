//! Module-list encoding.
//!
//! Items persist the ids of their attached modules as one string: canonical
//! hyphenated UUIDs joined by [`DELIMITER`], e.g.
//! `3f2504e0-4f89-11d3-9a0c-0305e82c3301:65bd4610-a0d8-11e3-a5e2-0800200c9a66`.
//! The empty string means "no modules".
//!
//! Decoding is best-effort: every token is parsed on its own and a bad token
//! never hides the valid ones around it.

use thiserror::Error;

use crate::id::ModuleId;

/// Separator between encoded module ids.
pub const DELIMITER: char = ':';

/// A token of an encoded module list that is not a valid module id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
	#[error("invalid module id {token:?} at position {index}: {reason}")]
	InvalidToken {
		/// Zero-based token position in the encoded string.
		index: usize,
		/// The offending token.
		token: String,
		/// Parser message.
		reason: String,
	},
}

/// Encodes module ids in order.
pub fn encode_id_list<'a, I>(ids: I) -> String
where
	I: IntoIterator<Item = &'a ModuleId>,
{
	let mut out = String::new();
	for (i, id) in ids.into_iter().enumerate() {
		if i > 0 {
			out.push(DELIMITER);
		}
		out.push_str(&id.to_string());
	}
	out
}

/// Decodes a module list, returning the valid ids and the rejected tokens.
pub fn parse_id_list(encoded: &str) -> (Vec<ModuleId>, Vec<CodecError>) {
	let mut ids = Vec::new();
	let mut errors = Vec::new();
	if encoded.is_empty() {
		return (ids, errors);
	}

	for (index, token) in encoded.split(DELIMITER).enumerate() {
		match ModuleId::parse_str(token) {
			Ok(id) => ids.push(id),
			Err(e) => errors.push(CodecError::InvalidToken {
				index,
				token: token.to_string(),
				reason: e.to_string(),
			}),
		}
	}
	(ids, errors)
}

/// Decodes a module list, logging and skipping tokens that fail to parse.
pub fn decode_id_list(encoded: &str) -> Vec<ModuleId> {
	let (ids, errors) = parse_id_list(encoded);
	for error in errors {
		tracing::error!(%error, "skipping unparseable module id");
	}
	ids
}
