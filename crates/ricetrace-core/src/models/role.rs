//! Role domain model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Grantable roles. The administrator is not a grantable role: exactly one
/// administrator identity exists, fixed when the registry is constructed.
///
/// Farmer and miller are not mutually exclusive; one identity may hold
/// both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Farmer,
    Miller,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Farmer => "farmer",
            Role::Miller => "miller",
        };
        f.write_str(s)
    }
}
