mod fake;

pub use fake::FakeEmbeddings;

// Re-export the Embeddings trait from core (forward-declared there).
pub use ragstore_core::Embeddings;
