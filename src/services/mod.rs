// Collaborator seams
// The networking layer implements these; the list core only calls them

pub mod collaborators;

pub use collaborators::{MutationSink, PageSource};
