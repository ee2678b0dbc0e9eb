//! Exit codes for `gatecheck`. Part of the public contract.

pub const ACCEPTED: i32 = 0;
pub const REJECTED: i32 = 1; // Guard refused the input
pub const CONFIG_ERROR: i32 = 2; // Config could not be loaded / guard not configured / usage
