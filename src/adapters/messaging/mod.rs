//! Message transports
//!
//! Email goes through an HTTP mail relay; instant messages go to the LINE
//! Messaging API. Both sit behind narrow traits so the notification engine
//! can be tested with fakes.

pub mod email;
pub mod factory;
pub mod line;
pub mod traits;

pub use email::{DisabledEmailSender, HttpMailRelay};
pub use factory::{create_email_sender, create_instant_messenger};
pub use line::LineMessagingClient;
pub use traits::{EmailSender, InstantMessenger};
