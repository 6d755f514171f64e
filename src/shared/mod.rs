pub mod constants;
pub mod flash;
pub mod templates;
pub mod test_helpers;
pub mod types;
pub mod validation;
