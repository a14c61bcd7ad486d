pub mod cookie;
pub mod duration;
pub mod jwt;
pub mod password;
pub mod text;

pub use duration::format_duration;
pub use jwt::{encode_access_token, encode_refresh_token};
pub use password::{hash_password, verify_password};
pub use text::{extract_mentions, render_markdown};
