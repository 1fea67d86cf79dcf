multiversx_sc::imports!();

use crate::types::IndexKind;

/// Reverse index from a participant address to the (owner key, entry key)
/// pairs it belongs to. Primary tables stay keyed by their owner; this
/// side answers "where is this address a member" without scanning them.
#[multiversx_sc::module]
pub trait MembershipModule {
    fn link_member(
        &self,
        kind: IndexKind,
        member: &ManagedAddress,
        owner_key: u64,
        entry_key: u64,
    ) -> bool {
        self.memberships(kind, member).insert((owner_key, entry_key))
    }

    fn unlink_member(
        &self,
        kind: IndexKind,
        member: &ManagedAddress,
        owner_key: u64,
        entry_key: u64,
    ) -> bool {
        self.memberships(kind, member).swap_remove(&(owner_key, entry_key))
    }

    /// First entry key the member holds under `owner_key`, if any.
    fn find_entry(&self, kind: IndexKind, member: &ManagedAddress, owner_key: u64) -> Option<u64> {
        self.memberships(kind, member)
            .iter()
            .find(|(owner, _)| *owner == owner_key)
            .map(|(_, entry)| entry)
    }

    #[storage_mapper("memberships")]
    fn memberships(
        &self,
        kind: IndexKind,
        member: &ManagedAddress,
    ) -> UnorderedSetMapper<(u64, u64)>;
}
