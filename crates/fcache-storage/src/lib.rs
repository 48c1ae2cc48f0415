//! fcache-storage: the get/set/delete contract the chunk store relies on,
//! implemented over OpenDAL (memcached in production, in-memory for tests)

pub mod backend;
pub mod health;
pub mod operator;

pub use backend::{BackendError, CacheBackend};
pub use health::{check_health, is_healthy};
pub use operator::{build_operator, memory_operator};
