//! Wire types shared by the curio client and its front ends.

pub mod domain;
pub mod error;
pub mod protocol;
pub mod timestamp;
