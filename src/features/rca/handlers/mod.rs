mod rca_handler;

pub use rca_handler::*;
