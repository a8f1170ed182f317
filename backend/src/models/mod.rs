pub mod connections;
pub mod profiles;

pub use connections::{
    Connection, ConnectionAction, ConnectionRequest, ConnectionStatus, NotificationKind,
    canonical_pair,
};
pub use profiles::{AnnotatedProfile, SearchMode, UserProfile};
