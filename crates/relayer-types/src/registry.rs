//! Registry trait for self-registering implementations.
//!
//! Each pluggable component (account, oracle, ledger) exposes a `Registry`
//! struct that ties the name used in configuration to its factory function.

/// Base trait for implementation registries.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this implementation,
	/// e.g. `"http"` for `[oracle.implementations.http]`.
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Returns the factory that builds this implementation from its TOML section.
	fn factory() -> Self::Factory;
}
