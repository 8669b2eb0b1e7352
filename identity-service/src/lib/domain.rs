pub mod account;
pub mod registration_code;
