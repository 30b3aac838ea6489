pub mod capacity;
pub mod notify;
pub mod ranking;
pub mod rate_limit;
pub mod registration_status;

pub use ranking::RankingScheme;
pub use registration_status::RegistrationStatus;
