use sigil_primitives::ModuleId;

/// Rejected registration. Indicates a setup bug in a module provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
	/// The id is already registered to another kind or under another name.
	#[error(
		"duplicate module id {id}: registered as {existing_name:?} ({existing_kind}), \
		 rejected {incoming_name:?} ({incoming_kind})"
	)]
	DuplicateIdentifier {
		id: ModuleId,
		existing_name: String,
		existing_kind: &'static str,
		incoming_name: String,
		incoming_kind: &'static str,
	},
	/// The name already belongs to a different id.
	#[error("duplicate module name {name:?}: owned by {existing}, rejected {incoming}")]
	DuplicateName {
		name: String,
		existing: ModuleId,
		incoming: ModuleId,
	},
	/// A provider failed while registering its kinds.
	#[error("provider {provider:?} failed: {reason}")]
	Provider {
		provider: &'static str,
		reason: String,
	},
}

/// Failure inside a module or module kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModuleError {
	#[error("malformed payload: {0}")]
	Payload(String),

	#[error("missing init argument {index}: expected {expected}")]
	MissingArgument {
		index: usize,
		expected: &'static str,
	},

	#[error("module panicked: {0}")]
	Panicked(String),

	#[error("{0}")]
	Other(String),
}

/// Migration table errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MigrationError {
	#[error("malformed migration entry {entry:?}: {reason}")]
	Malformed { entry: String, reason: String },

	#[error("migration {from} > {to} would close a cycle")]
	Cycle { from: ModuleId, to: ModuleId },

	#[error("migration chain starting at {start} does not terminate")]
	Unterminated { start: ModuleId },
}
