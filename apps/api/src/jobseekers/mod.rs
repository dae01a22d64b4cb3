pub mod handlers;
pub mod options;
pub mod validation;
