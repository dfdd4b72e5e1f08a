pub mod gateway;
pub mod handlers;
pub mod market;
pub mod session;
