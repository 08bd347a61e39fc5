pub mod client;
pub mod decode;

pub use client::{HttpClient, DEFAULT_TIMEOUT};
pub use decode::{bookmark_list_from_value, decode_bookmark_list, decode_object};
