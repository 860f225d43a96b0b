pub mod actors;
pub mod discovery;
pub mod genre_filter;
pub mod library;
pub mod pagination;
pub mod providers;
pub mod search;

pub use actors::ActorDirectory;
pub use discovery::{DiscoveryService, SessionSnapshot};
pub use library::{Library, LibraryAction, LibraryStore, ListKind};
pub use providers::{MovieProvider, OmdbProvider};
