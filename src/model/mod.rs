/// 领域模型
/// Domain models shared by the stores and the HTTP layer
pub mod note;
pub mod user;

pub use note::{ListParams, Note, SortDirection};
pub use user::User;
