pub mod memory;
pub mod models;
pub mod repository;

pub use memory::MemoryUserStore;
pub use models::{NewUser, Role, User, UserSummary};
pub use repository::UserRepository;
