pub mod directory;
pub mod notifier;
pub mod relationships;
pub mod store;

pub use directory::{MemoryDirectory, ProfileDirectory};
pub use notifier::{Notifier, WebhookNotifier};
pub use relationships::{Feedback, NetworkOverview, RelationError, RelationshipManager, Severity};
pub use store::{MemoryStore, RelationshipStore, StoreError};
