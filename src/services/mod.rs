// Service exports
pub mod matching;
pub mod memory;
pub mod postgres;
pub mod store;

pub use matching::{commit_outcome, load_dataset, load_history, Dataset, MatchingService};
pub use memory::{InMemoryStore, StoreState};
pub use postgres::{PostgresStore, Tables};
pub use store::{GuestRow, HostRow, MatchStore, NewMatch, StoreError, StoreTransaction};
