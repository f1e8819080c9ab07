pub mod json;

pub use json::{decode_json, decode_query};
