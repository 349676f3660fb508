// SPDX-License-Identifier: MIT OR Apache-2.0

pub mod causality;
pub mod event;
pub mod value;

pub use self::causality::Causality;
pub use self::event::{Event, NewEvent};
pub use self::value::{Metadata, Value};
