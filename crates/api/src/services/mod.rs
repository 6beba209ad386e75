pub mod cookies;
pub mod email;
