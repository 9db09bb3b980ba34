//! HTTP implementations of the collaborator traits
//!
//! OpenAI-compatible embeddings and chat completions, and a REST hotel search.

pub mod completion;
pub mod embedding;
pub mod hotels;
mod http;


pub use completion::OpenAiCompletion;
pub use embedding::OpenAiEmbeddings;
pub use hotels::HttpHotelSearch;
