pub mod product;
pub mod user;

pub use product::{CreatorProducts, Product, ProductRequest, ProductResponse};
pub use user::{DegradedReason, RemoteUser};
