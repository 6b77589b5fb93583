pub mod error;
pub mod hash;
pub mod output;
pub mod session;
pub mod store;
pub mod time;
pub mod types;
