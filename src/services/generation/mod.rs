pub mod interface;

pub use interface::{GenerationError, TextGenerator};
