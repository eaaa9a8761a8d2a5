pub mod user;

pub use user::{
    CreateUserRequest, LoginRequest, LoginResponse, NewUser, RegisterRequest, UpdateUserRequest,
    User, UserChanges, UserResponse, DEFAULT_ROLE,
};
