pub mod backend;
pub mod client;
pub mod impl_memory;
pub mod session;

pub use backend::DocumentBackend;
pub use client::StoreClient;
pub use impl_memory::InMemoryBackend;
pub use session::{Session, SessionToken};
