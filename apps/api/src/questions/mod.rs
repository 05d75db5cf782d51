// Question sets: generation via the provider, flat row storage, grouped reads, stats.
// All provider calls go through llm_client; all SQL lives in repository.

pub mod extract;
pub mod generator;
pub mod handlers;
pub mod prompts;
pub mod repository;
pub mod service;

#[cfg(test)]
pub mod test_support;
