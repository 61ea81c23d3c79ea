pub mod credentials;
pub mod password;
pub mod sessions;
pub mod sweeper;
pub mod timing;
