use gatecore::{
    assignment::UserAssignment,
    audit::PermissionCheck,
    permission::Permission,
    role::Role,
};
use indexmap::IndexMap;
use std::collections::BTreeMap;

use crate::condition::Evaluator;

/// Reason recorded for a check that no permission satisfied.
pub const PERMISSION_NOT_FOUND: &str = "Permission not found";

/// The permission checker along with the catalogs, the user assignments
/// and the audit log it draws on.
///
/// A check walks the candidates in a fixed precedence and the first one
/// satisfied wins:
///
/// 1. the permissions granted directly to the user;
/// 2. the permissions of each assigned role, in assignment order;
/// 3. the custom permissions attached to the user.
///
/// Mutating calls take `&mut self`; sharing a manager between threads
/// requires external synchronization.
#[derive(Debug)]
pub struct PermissionManager {
    enabled: bool,
    role_inheritance: bool,
    permissions: IndexMap<String, Permission>,
    roles: IndexMap<String, Role>,
    assignments: BTreeMap<String, UserAssignment>,
    checks: Vec<PermissionCheck>,
    evaluator: Evaluator,
}

mod impls;
