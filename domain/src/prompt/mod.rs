//! Prompt domain
//!
//! Templates for the prompts sent to models at each orchestration stage.

mod template;

pub use template::PromptTemplate;
