//! Check-ins: persisting tags, counting crowds, reading aggregates back.

pub mod record;
pub mod session;
pub mod sync;
pub mod tags;

pub use record::{COLLECTION, CheckInRecord};
pub use session::{CheckInSession, CheckInState, Effect, Intent, reduce};
pub use sync::CheckInSync;
