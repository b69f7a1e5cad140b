//! Users
//!
//! Accounts and authentication live outside this crate; services only receive the
//! id of the acting user.

use crate::ids::TypedId;

/// User Record marker
#[derive(Debug)]
pub struct UserRecord;

/// User Id
pub type UserId = TypedId<UserRecord>;
