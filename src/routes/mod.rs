/// Router Module Index
///
/// Routes are split by access level so the authentication gate is applied to a whole
/// module at once rather than per handler.

/// Routes accessible to anonymous clients.
pub mod public;

/// Routes behind the authentication gate (`auth::auth_middleware`).
pub mod protected;
