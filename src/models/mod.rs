pub mod auth;
pub mod catalog;
pub mod common;
pub mod ledger;
pub mod member;
pub mod pagination;
pub mod report;

pub use auth::*;
pub use catalog::*;
pub use common::*;
pub use ledger::*;
pub use member::*;
pub use pagination::*;
pub use report::*;
