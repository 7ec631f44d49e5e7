pub mod session_ledger;
pub mod token_issuer;
