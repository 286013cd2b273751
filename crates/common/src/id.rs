//! ID generation utilities.

use ulid::Ulid;

/// ID generator for documents.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based ID.
    ///
    /// IDs are lowercase, 26 characters long and sort by creation time,
    /// which the repositories rely on for newest-first ordering ties.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Whether `id` has the shape of an ID produced by [`Self::generate`].
    #[must_use]
    pub fn is_valid(id: &str) -> bool {
        id.len() == 26 && Ulid::from_string(&id.to_uppercase()).is_ok()
    }
}
