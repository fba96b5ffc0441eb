// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod spec;
mod status;
mod supervisor;

pub use spec::WorkerSpec;
pub use status::ProcessStatus;
pub use supervisor::{Supervisor, SupervisorError};
