pub mod account;
pub mod registration_code;

pub use account::PostgresAccountRepository;
pub use registration_code::PostgresRegistrationCodeRepository;
