//! Use cases (application services)

pub mod adaptive_ensemble;
pub mod build_consensus;
pub mod diffuse_prompt;
pub mod execute_plan;
pub mod orchestrate;
pub mod route_query;

#[cfg(test)]
pub(crate) mod test_support;
