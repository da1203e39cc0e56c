pub mod file_magic;
pub mod jwt;
pub mod parameter_error_handler;
pub mod password;

pub use file_magic::decode_text;
pub use parameter_error_handler::{form_error_handler, json_error_handler, query_error_handler};
