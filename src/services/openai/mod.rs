pub mod provider;

pub use provider::OpenAiProvider;
