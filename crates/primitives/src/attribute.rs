use uuid::Uuid;

/// Host attribute an effect modifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
	MaxHealth,
	KnockbackResistance,
	MovementSpeed,
}

impl AttributeKind {
	/// Attribute name as the host stores it.
	pub const fn host_name(self) -> &'static str {
		match self {
			Self::MaxHealth => "generic.maxHealth",
			Self::KnockbackResistance => "generic.knockbackResistance",
			Self::MovementSpeed => "generic.movementSpeed",
		}
	}
}

/// How an effect's amount combines with the base value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeOperation {
	AddNumber,
	MultiplyPercentage,
	AddPercentage,
}

impl AttributeOperation {
	/// Numeric operation code as the host stores it.
	pub const fn code(self) -> u8 {
		match self {
			Self::AddNumber => 0,
			Self::MultiplyPercentage => 1,
			Self::AddPercentage => 2,
		}
	}
}

/// One attribute modifier a module wants applied while it is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeEffect {
	pub id: Uuid,
	/// Stored name, prefixed with the signed high 64 bits of `id` so names
	/// from different modules never collide on the host.
	pub name: String,
	pub kind: AttributeKind,
	pub operation: AttributeOperation,
	pub amount: f64,
}

impl AttributeEffect {
	/// Creates an effect, deriving the stored name from `id` and `name`.
	pub fn new(
		id: Uuid,
		name: &str,
		kind: AttributeKind,
		operation: AttributeOperation,
		amount: f64,
	) -> Self {
		let (high, _) = id.as_u64_pair();
		Self {
			id,
			name: format!("{}.{}", high as i64, name),
			kind,
			operation,
			amount,
		}
	}
}
