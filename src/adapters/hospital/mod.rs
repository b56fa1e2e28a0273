//! Hospital site adapters
//!
//! Each hospital publishes its schedule and queue through its own HTML pages.
//! The [`HospitalAdapter`] trait is the common interface; [`CmuhAdapter`] and
//! [`HmmhAdapter`] speak the two supported sites. Shared plumbing lives in
//! [`http`] (client, headers, retry), [`html`] (tolerant scanning),
//! [`dates`] (AD and ROC dates) and [`fanout`] (bounded concurrency).

pub mod cmuh;
pub mod dates;
pub mod factory;
pub mod fanout;
pub mod hmmh;
pub mod html;
pub mod http;
mod r#trait;

pub use cmuh::CmuhAdapter;
pub use factory::{create_hospital_adapter, create_hospital_adapters};
pub use fanout::fan_out_bounded;
pub use hmmh::HmmhAdapter;
pub use r#trait::HospitalAdapter;
