pub mod auth;
pub mod event;
pub mod leaderboard;
pub mod registration;
