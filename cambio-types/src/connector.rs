//! Provider metadata types usable across crates.

/// Typed key for identifying providers in priority configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProviderKey(pub &'static str);

impl ProviderKey {
    /// Construct a new typed provider key from a static name.
    ///
    /// This is useful when configuring per-entity priorities.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Returns the inner static string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl From<ProviderKey> for &'static str {
    fn from(k: ProviderKey) -> Self {
        k.0
    }
}
