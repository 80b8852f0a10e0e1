mod router;

pub(crate) use router::NotificationRouter;
pub use router::{Notification, PartyNames, UNKNOWN_PARTY_NAME};
