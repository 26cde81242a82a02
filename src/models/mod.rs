pub mod file;
pub mod folder;
pub mod user;

pub use file::*;
pub use folder::*;
pub use user::*;
