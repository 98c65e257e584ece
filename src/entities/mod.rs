pub mod accounts;
pub mod members;
pub mod shop_owners;
pub mod transactions;

pub use accounts as account_entity;
pub use members as member_entity;
pub use shop_owners as shop_owner_entity;
pub use transactions as transaction_entity;
pub use transactions::TransactionType;
