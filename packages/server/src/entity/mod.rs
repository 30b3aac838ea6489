pub mod event;
pub mod leaderboard_entry;
pub mod registration;
pub mod role;
pub mod role_permission;
pub mod user;
