pub mod dispatch;
pub mod outbound;
pub mod protocol;
