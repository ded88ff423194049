// Brand voice generation: prompt building, response parsing, fallback copy and the
// per-product orchestrator. All completion calls go through llm_client.

pub mod fallback;
pub mod handlers;
pub mod parser;
pub mod pipeline;
pub mod prompts;
pub mod request;

pub use pipeline::Pipeline;
