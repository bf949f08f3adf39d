//! Resume analysis: request normalization, prompt construction, model
//! output validation and the pipeline that ties them together.

#[cfg(test)]
pub(crate) mod fixtures;
pub mod handlers;
pub mod improvements;
pub mod language;
pub mod pipeline;
pub mod prompt_builder;
pub mod prompts;
pub mod request;
pub mod schema;
pub mod style;
pub mod validator;
