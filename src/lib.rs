// SPDX-License-Identifier: MIT OR Apache-2.0

pub mod core;

pub use crate::core::config::SubstrateConfig;
pub use crate::core::runtime::Substrate;
