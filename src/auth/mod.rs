/*!
 * # Authorization Module
 *
 * Identity of the actor behind a lifecycle or ledger operation. Authentication
 * itself happens in the surrounding application; requests reach this crate with
 * an already verified uid and role.
 */

pub mod rbac;

pub use rbac::{Actor, Role, NOTIFIED_ROLES};
