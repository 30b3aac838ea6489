pub mod leaderboard;
pub mod registration;
