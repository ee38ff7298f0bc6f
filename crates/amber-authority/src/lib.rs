pub mod authority;
pub mod dispatch;
pub mod registry;

pub use authority::{AuthorityError, RequestAck, RequestId, SignalAuthority};
pub use registry::{InMemoryAuthority, RequestStatus, SignalRequest};
