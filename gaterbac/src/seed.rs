//! The built-in permission and role catalogs.

use gatecore::{
    permission::{
        Condition,
        Operator,
        Permission,
    },
    role::Role,
};

/// The built-in permissions, as `resource: action...`.  The `view_own`
/// actions are restricted to records owned by the acting user.
const DEFAULT_PERMISSIONS: &str = "\
auth: login logout register
dashboard: view export
restaurants: view create edit delete view_own
valuations: view create edit delete view_own
budgets: view create edit delete approve
users: view create edit delete view_own
reports: view create export
settings: view edit
admin: access system
";

/// The built-in roles.
///
/// The fields are comma separated in the form of: role, permissions
///
/// role - the id of the role
/// permissions - whitespace separated permission ids, or `*` for every
/// built-in permission
const DEFAULT_ROLES: &str = "\
super_admin, *

# everything bar the system level settings
admin, auth.login auth.logout auth.register
    dashboard.view dashboard.export
    restaurants.view restaurants.create restaurants.edit restaurants.delete
    valuations.view valuations.create valuations.edit valuations.delete
    budgets.view budgets.create budgets.edit budgets.delete budgets.approve
    users.view users.create users.edit users.delete
    reports.view reports.create reports.export
    settings.view settings.edit
    admin.access

manager, auth.login auth.logout
    dashboard.view dashboard.export
    restaurants.view restaurants.create restaurants.edit
    valuations.view valuations.create valuations.edit
    budgets.view budgets.create budgets.edit budgets.approve
    users.view
    reports.view reports.create reports.export
    settings.view

# franchisees only see what they own
franchisee, auth.login auth.logout
    dashboard.view
    restaurants.view_own valuations.view_own
    budgets.view budgets.create
    users.view_own
    reports.view

advisor, auth.login auth.logout
    dashboard.view dashboard.export
    restaurants.view
    valuations.view valuations.create valuations.edit
    budgets.view
    reports.view reports.create reports.export

user, auth.login auth.logout auth.register dashboard.view users.view_own
";

const ROLE_NAMES: &[(&str, &str, &str)] = &[
    ("super_admin", "Super Administrator", "Unrestricted access"),
    ("admin", "Administrator", "Full access except system settings"),
    ("manager", "Manager", "Manages restaurants, valuations and budgets"),
    ("franchisee", "Franchisee", "Access to owned restaurants and valuations"),
    ("advisor", "Advisor", "Prepares valuations and reports"),
    ("user", "User", "Basic authenticated access"),
];

pub fn default_permissions() -> Vec<Permission> {
    DEFAULT_PERMISSIONS.lines()
        .filter_map(|line| line.split_once(':'))
        .flat_map(|(resource, actions)| {
            let resource = resource.trim();
            actions.split_whitespace()
                .map(move |action| {
                    let permission = Permission::new(resource, action)
                        .name(format!("{} {resource}", action.replace('_', " ")));
                    match (resource, action) {
                        ("users", "view_own") => permission.condition(
                            Condition::field("user_id", Operator::Equals, "{{user.id}}")
                        ),
                        (_, "view_own") => permission.condition(Condition::owner()),
                        _ => permission,
                    }
                })
        })
        .collect()
}

/// Parse roles from the line format of `DEFAULT_ROLES`; indented lines
/// continue the permission list of the role above.
pub fn parse_roles(text: &str, all: &[Permission]) -> Vec<Role> {
    let mut roles: Vec<Role> = Vec::new();
    for line in text.lines() {
        let line = line
            .split('#')
            .next()
            .unwrap_or_default();
        if line.trim().is_empty() {
            continue;
        }
        let ids = match line.starts_with(char::is_whitespace) {
            true => line,
            false => match line.split_once(',') {
                Some((id, ids)) => {
                    roles.push(Role::new(id.trim()));
                    ids
                }
                None => continue,
            },
        };
        let Some(role) = roles.last_mut() else {
            continue;
        };
        for id in ids.split_whitespace() {
            match id {
                "*" => role.permissions.extend(all.iter().map(|p| p.id.clone())),
                id => role.permissions.push(id.to_string()),
            }
        }
    }
    roles
}

pub fn default_roles(all: &[Permission]) -> Vec<Role> {
    parse_roles(DEFAULT_ROLES, all)
        .into_iter()
        .map(|role| match ROLE_NAMES.iter().find(|(id, ..)| *id == role.id) {
            Some((_, name, description)) => role
                .name(*name)
                .description(*description),
            None => role,
        })
        .collect()
}
