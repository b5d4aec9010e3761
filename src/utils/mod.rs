pub mod ip;

pub use ip::{ClientIpResolver, is_private_or_local};
