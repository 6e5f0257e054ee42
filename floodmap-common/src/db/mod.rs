//! Report persistence and the radius query

pub mod init;
pub mod models;
pub mod proximity;
pub mod reports;

pub use init::*;
pub use models::*;
pub use proximity::*;
pub use reports::*;
