pub mod vector;

pub use vector::retrieve_context;
