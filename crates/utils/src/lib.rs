pub mod logging;
pub mod phone;
pub mod response;
pub mod token;
