//! 推荐握手
//!
//! 把推荐链接（`?ref=<token>`）的点击转成一条线索，每个浏览器最多一次。

mod handshake;

pub use handshake::{HANDSHAKE_REVEAL_DELAY, HandshakeError, HandshakeState, ReferralHandshake};
