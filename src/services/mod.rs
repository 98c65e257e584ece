pub mod auth_service;
pub mod catalog_service;
pub mod ledger_service;
pub mod member_service;
pub mod report_service;

pub use auth_service::*;
pub use catalog_service::*;
pub use ledger_service::*;
pub use member_service::*;
pub use report_service::*;
