pub mod behavioral;
pub mod driver;
pub mod error;
pub mod fingerprint;
pub mod session;
pub mod stealth;
pub mod wait;
