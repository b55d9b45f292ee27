mod embedding;
mod parser;
mod validator;
mod vector_store;

pub use embedding::{
    BatchOutcome, CONNECTION_TEST_TEXT, EmbedFailure, EmbedderService, EmbeddingProvider,
    YandexEmbeddingClient,
};
pub use parser::{LlamaParseClient, ParserService, ParsingProvider, ProviderPage, renumber_pages};
pub use validator::FileValidator;
pub use vector_store::{DocumentStore, PgVectorBackend, SupabaseBackend, create_backend};
