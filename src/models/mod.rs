pub mod agent;
pub mod cart;
pub mod user;

pub use agent::Agent;
pub use cart::CartItem;
pub use user::{RegisterRequest, Role, UpdateProfileRequest, User};
