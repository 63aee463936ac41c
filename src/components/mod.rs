//! # Component registration types.
//!
//! - [`ComponentOptions`] - one partial configuration layer
//! - [`ComponentDescriptor`] - resolved registration (loader + attributes)

mod descriptor;
mod options;

pub use descriptor::{ComponentDescriptor, DEFAULT_PRIORITY};
pub use options::ComponentOptions;
