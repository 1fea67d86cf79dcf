multiversx_sc::imports!();

use crate::config;
use crate::errors::*;
use crate::events;
use crate::membership;
use crate::types::{IndexKind, Role};

/// Scope of contract-wide roles. Subnet ids start at 1.
pub const GLOBAL_SCOPE: u64 = 0;

#[multiversx_sc::module]
pub trait RolesModule:
    config::ConfigModule + events::EventsModule + membership::MembershipModule
{
    #[endpoint(grantRole)]
    fn grant_role(&self, scope: u64, role: Role, account: ManagedAddress) {
        self.require_scope_admin(scope);
        require!(!account.is_zero(), ERR_ZERO_ADDRESS);

        if self.role_members(scope, role).insert(account.clone()) {
            self.link_member(IndexKind::Role, &account, scope, role.id());
            self.role_granted_event(scope, role, &account);
        }
    }

    #[endpoint(revokeRole)]
    fn revoke_role(&self, scope: u64, role: Role, account: ManagedAddress) {
        self.require_scope_admin(scope);

        if self.role_members(scope, role).swap_remove(&account) {
            self.unlink_member(IndexKind::Role, &account, scope, role.id());
            self.role_revoked_event(scope, role, &account);
        }
    }

    #[view(hasRole)]
    fn has_role(&self, scope: u64, role: Role, account: &ManagedAddress) -> bool {
        self.role_members(scope, role).contains(account)
    }

    /// (scope, role id) pairs held by `account`.
    #[view(getRolesOf)]
    fn get_roles_of(&self, account: &ManagedAddress) -> MultiValueEncoded<MultiValue2<u64, u64>> {
        let mut result = MultiValueEncoded::new();
        for (scope, role) in self.memberships(IndexKind::Role, account).iter() {
            result.push((scope, role).into());
        }
        result
    }

    #[view(getRoleMembers)]
    fn get_role_members(&self, scope: u64, role: Role) -> MultiValueEncoded<ManagedAddress> {
        let mut result = MultiValueEncoded::new();
        for account in self.role_members(scope, role).iter() {
            result.push(account);
        }
        result
    }

    // ========================================================
    // INTERNAL: authority checks
    // ========================================================

    fn require_scope_admin(&self, scope: u64) {
        let caller = self.blockchain().get_caller();
        let is_admin = if scope == GLOBAL_SCOPE {
            self.is_contract_owner(&caller)
        } else {
            !self.scope_admin(scope).is_empty() && self.scope_admin(scope).get() == caller
        };
        require!(is_admin, ERR_UNAUTHORIZED);
    }

    /// Scope admin, a holder of `role` in the scope, a holder of `role`
    /// globally, or the contract owner.
    fn has_scope_authority(&self, scope: u64, role: Role, account: &ManagedAddress) -> bool {
        if self.is_contract_owner(account) || self.has_role(GLOBAL_SCOPE, role, account) {
            return true;
        }
        if scope == GLOBAL_SCOPE {
            return false;
        }
        let admin = self.scope_admin(scope);
        (!admin.is_empty() && admin.get() == *account) || self.has_role(scope, role, account)
    }

    fn require_scope_authority(&self, scope: u64, role: Role) {
        let caller = self.blockchain().get_caller();
        require!(
            self.has_scope_authority(scope, role, &caller),
            ERR_UNAUTHORIZED
        );
    }

    #[view(getScopeAdmin)]
    #[storage_mapper("scopeAdmin")]
    fn scope_admin(&self, scope: u64) -> SingleValueMapper<ManagedAddress>;

    #[storage_mapper("roleMembers")]
    fn role_members(&self, scope: u64, role: Role) -> UnorderedSetMapper<ManagedAddress>;
}
