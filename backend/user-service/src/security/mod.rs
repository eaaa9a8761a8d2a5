pub mod password;
pub mod resolver;

pub use password::{hash_password, verify_password};
pub use resolver::StoreBackedResolver;
