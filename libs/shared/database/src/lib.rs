pub mod memory;

pub use memory::{InMemoryDatabase, SeedData};
