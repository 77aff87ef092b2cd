mod openai;
mod pinecone;
mod provider;

pub use openai::{OpenAIConfig, OpenAIProvider};
pub use pinecone::PineconeInferenceProvider;
pub use provider::EmbeddingProvider;

#[cfg(test)]
pub use provider::MockEmbeddingProvider;
