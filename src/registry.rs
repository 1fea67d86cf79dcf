multiversx_sc::imports!();

use crate::config::{self, PERCENT_DENOMINATOR, RESOURCE_TYPES};
use crate::distributor::{self, DEFAULT_CLUSTER_WEIGHT};
use crate::errors::*;
use crate::events;
use crate::membership;
use crate::pools;
use crate::roles::{self, GLOBAL_SCOPE};
use crate::types::{
    Cluster, ClusterStatus, IndexKind, PriceChangeRequest, Role, Subnet, SubnetParams,
};

#[multiversx_sc::module]
pub trait ResourceRegistryModule:
    config::ConfigModule
    + events::EventsModule
    + membership::MembershipModule
    + roles::RolesModule
    + pools::RevenuePoolsModule
    + distributor::RevenueDistributorModule
{
    // ========================================================
    // ENDPOINT: createSubnet
    // Collateral NFT + creation fee in, subnet id out.
    // ========================================================

    #[payable("*")]
    #[endpoint(createSubnet)]
    fn create_subnet(&self, params: SubnetParams<Self::Api>) -> u64 {
        let caller = self.blockchain().get_caller();
        let attached = self.attached_payments();
        let collateral_nonce = match attached.nft_nonce {
            Some(nonce) => nonce,
            None => sc_panic!(ERR_NOT_OWNER),
        };

        let fee = self.subnet_creation_fee().get();
        require!(attached.amount >= fee, ERR_INSUFFICIENT_COLLATERAL);

        require!(!params.owner_dao.is_zero(), ERR_ZERO_ADDRESS);
        require!(params.unit_prices.len() == RESOURCE_TYPES, ERR_LENGTH_MISMATCH);
        require!(params.max_clusters > 0, ERR_INVALID_CAPACITY);
        require!(
            params.support_fee_rate <= PERCENT_DENOMINATOR,
            ERR_INVALID_PERCENTAGE
        );

        let subnet_id = self.subnet_count().get() + 1;
        let subnet = Subnet {
            id: subnet_id,
            owner_dao: params.owner_dao,
            unit_prices: params.unit_prices,
            other_attributes: params.other_attributes,
            max_clusters: params.max_clusters,
            listed: true,
            sovereign: params.sovereign,
            cloud_provider_type: params.cloud_provider_type,
            support_fee_rate: params.support_fee_rate,
            collateral_required: params.collateral_required,
            collateral_nonce,
            created_at: self.blockchain().get_block_timestamp(),
        };

        self.subnets(subnet_id).set(&subnet);
        self.subnet_count().set(subnet_id);
        self.scope_admin(subnet_id).set(&subnet.owner_dao);
        self.locked_collateral().insert(collateral_nonce);
        self.credit_treasury(&fee);

        let excess = &attached.amount - &fee;
        self.pay_out(&caller, &excess);
        self.subnet_created_event(subnet_id, &subnet.owner_dao, collateral_nonce, &fee);

        subnet_id
    }

    #[endpoint(changeSubnetListing)]
    fn change_subnet_listing(&self, subnet_id: u64, listed: bool) {
        self.require_scope_authority(GLOBAL_SCOPE, Role::ClusterListManager);
        let mut subnet = self.require_subnet(subnet_id);

        subnet.listed = listed;
        self.subnets(subnet_id).set(&subnet);
        self.subnet_listing_changed_event(subnet_id, listed);
    }

    #[endpoint(changeSubnetAttributes)]
    fn change_subnet_attributes(
        &self,
        subnet_id: u64,
        max_clusters: u64,
        support_fee_rate: u64,
        collateral_required: BigUint,
        other_attributes: ManagedVec<u64>,
    ) {
        let mut subnet = self.require_subnet(subnet_id);
        self.require_subnet_admin(&subnet);
        require!(max_clusters > 0, ERR_INVALID_CAPACITY);
        require!(
            max_clusters >= self.slots_used(subnet_id).get(),
            ERR_CAPACITY_BELOW_USAGE
        );
        require!(support_fee_rate <= PERCENT_DENOMINATOR, ERR_INVALID_PERCENTAGE);

        subnet.max_clusters = max_clusters;
        subnet.support_fee_rate = support_fee_rate;
        subnet.collateral_required = collateral_required;
        subnet.other_attributes = other_attributes;
        self.subnets(subnet_id).set(&subnet);
        self.subnet_attributes_changed_event(subnet_id, max_clusters);
    }

    // ========================================================
    // ENDPOINT: clusterSignUp
    // Takes a slot; whitelisted owners are listed immediately.
    // ========================================================

    #[payable("*")]
    #[endpoint(clusterSignUp)]
    fn cluster_sign_up(
        &self,
        subnet_id: u64,
        dns_ip: ManagedBuffer,
        wallet: ManagedAddress,
        operator: ManagedAddress,
        name: ManagedBuffer,
    ) -> u64 {
        let caller = self.blockchain().get_caller();
        let subnet = self.require_subnet(subnet_id);
        require!(subnet.listed, ERR_SUBNET_NOT_LISTED);
        require!(subnet.sovereign || !dns_ip.is_empty(), ERR_DNS_REQUIRED);
        require!(!wallet.is_zero(), ERR_ZERO_ADDRESS);

        let attached = self.attached_payments();
        let collateral_nonce = match attached.nft_nonce {
            Some(nonce) => nonce,
            None => sc_panic!(ERR_NOT_OWNER),
        };
        require!(
            attached.amount >= subnet.collateral_required,
            ERR_INSUFFICIENT_FUNDS
        );
        require!(
            self.total_cluster_spots_available(subnet_id) > 0,
            ERR_NO_SPOTS_AVAILABLE
        );

        let status = if self.is_whitelisted(subnet_id, &caller) {
            ClusterStatus::Listed
        } else {
            ClusterStatus::Waiting
        };

        let cluster_id = self.cluster_count(subnet_id).get() + 1;
        let stake = subnet.collateral_required.clone();
        let cluster = Cluster {
            id: cluster_id,
            subnet_id,
            owner: caller.clone(),
            wallet: wallet.clone(),
            operator,
            dns_ip,
            name,
            collateral_nonce,
            stake: stake.clone(),
            status,
        };

        self.clusters(subnet_id, cluster_id).set(&cluster);
        self.cluster_count(subnet_id).set(cluster_id);
        self.slots_used(subnet_id).update(|used| *used += 1);
        self.stake_locked(&caller).update(|locked| *locked += &stake);
        self.locked_collateral().insert(collateral_nonce);
        self.link_member(IndexKind::ClusterWallet, &wallet, subnet_id, cluster_id);
        if status == ClusterStatus::Listed {
            self.set_cluster_weight(subnet_id, cluster_id, DEFAULT_CLUSTER_WEIGHT);
        }

        let excess = &attached.amount - &stake;
        self.pay_out(&caller, &excess);
        self.cluster_signed_up_event(subnet_id, cluster_id, &caller, status, &stake);

        cluster_id
    }

    // ========================================================
    // Whitelist: ordered, tombstoned on removal
    // ========================================================

    #[endpoint(addClusterToWhitelisted)]
    fn add_cluster_to_whitelisted(&self, subnet_id: u64, account: ManagedAddress) -> usize {
        self.require_subnet(subnet_id);
        self.require_scope_authority(subnet_id, Role::WhitelistManager);
        require!(!account.is_zero(), ERR_ZERO_ADDRESS);

        if let Some(index) = self.find_entry(IndexKind::Whitelist, &account, subnet_id) {
            return index as usize;
        }

        let index = self.whitelist(subnet_id).push(&account);
        self.link_member(IndexKind::Whitelist, &account, subnet_id, index as u64);
        self.whitelist_updated_event(subnet_id, &account, index, true);
        index
    }

    /// Zeroes slot `index` only; later indices keep their positions.
    #[endpoint(removeClusterFromWhitelisted)]
    fn remove_cluster_from_whitelisted(&self, subnet_id: u64, account: ManagedAddress, index: usize) {
        self.require_subnet(subnet_id);
        self.require_scope_authority(subnet_id, Role::WhitelistManager);
        require!(!account.is_zero(), ERR_ZERO_ADDRESS);

        let whitelist = self.whitelist(subnet_id);
        require!(
            index >= 1 && index <= whitelist.len() && whitelist.get(index) == account,
            ERR_WHITELIST_INDEX_MISMATCH
        );

        self.whitelist(subnet_id).set(index, &ManagedAddress::zero());
        self.unlink_member(IndexKind::Whitelist, &account, subnet_id, index as u64);
        self.whitelist_updated_event(subnet_id, &account, index, false);
    }

    // ========================================================
    // Listing governance
    // ========================================================

    /// Waiting → Listed, or Delisted → Listed when a slot is free and the
    /// cluster still holds the subnet's current collateral.
    #[endpoint(approveListingCluster)]
    fn approve_listing_cluster(&self, subnet_id: u64, cluster_id: u64, weight: u64) {
        let subnet = self.require_subnet(subnet_id);
        self.require_scope_authority(subnet_id, Role::ClusterListManager);
        let mut cluster = self.require_cluster(subnet_id, cluster_id);

        match cluster.status {
            ClusterStatus::Listed => sc_panic!(ERR_CLUSTER_ALREADY_LISTED),
            ClusterStatus::Delisted => {
                require!(
                    cluster.stake >= subnet.collateral_required,
                    ERR_INSUFFICIENT_COLLATERAL
                );
                require!(
                    self.slots_used(subnet_id).get() < subnet.max_clusters,
                    ERR_NO_SPOTS_AVAILABLE
                );
                self.slots_used(subnet_id).update(|used| *used += 1);
            },
            // already holds its slot
            ClusterStatus::Waiting => {},
        }

        cluster.status = ClusterStatus::Listed;
        self.clusters(subnet_id, cluster_id).set(&cluster);
        self.set_cluster_weight(subnet_id, cluster_id, weight);
        self.cluster_status_changed_event(subnet_id, cluster_id, ClusterStatus::Listed);
    }

    #[endpoint(delistCluster)]
    fn delist_cluster(&self, subnet_id: u64, cluster_id: u64) {
        self.require_subnet(subnet_id);
        self.require_scope_authority(subnet_id, Role::ClusterListManager);
        let mut cluster = self.require_cluster(subnet_id, cluster_id);
        require!(
            cluster.status != ClusterStatus::Delisted,
            ERR_CLUSTER_ALREADY_DELISTED
        );

        cluster.status = ClusterStatus::Delisted;
        self.clusters(subnet_id, cluster_id).set(&cluster);
        self.slots_used(subnet_id).update(|used| *used -= 1);
        if self.cluster_weight(subnet_id, cluster_id).get() > 0 {
            self.set_cluster_weight(subnet_id, cluster_id, 0);
        }
        self.cluster_status_changed_event(subnet_id, cluster_id, ClusterStatus::Delisted);
    }

    #[endpoint(addWeight)]
    fn add_weight(&self, subnet_id: u64, cluster_id: u64, weight: u64) {
        self.require_subnet(subnet_id);
        self.require_scope_authority(subnet_id, Role::WeightManager);
        let cluster = self.require_cluster(subnet_id, cluster_id);
        require!(cluster.status == ClusterStatus::Listed, ERR_CLUSTER_NOT_LISTED);

        self.set_cluster_weight(subnet_id, cluster_id, weight);
    }

    #[endpoint(resetWeights)]
    fn reset_weights(&self, subnet_id: u64) {
        self.require_subnet(subnet_id);
        self.require_scope_authority(subnet_id, Role::WeightManager);

        self.reset_subnet_weights(subnet_id);
    }

    // ========================================================
    // Price changes: request, wait, apply
    // ========================================================

    #[endpoint(requestClusterPriceChange)]
    fn request_cluster_price_change(&self, subnet_id: u64, new_prices: ManagedVec<BigUint>) {
        self.require_subnet(subnet_id);
        self.require_scope_authority(subnet_id, Role::PriceManager);
        require!(new_prices.len() == RESOURCE_TYPES, ERR_LENGTH_MISMATCH);

        let requested_at = self.blockchain().get_block_timestamp();
        self.price_change_requested_event(subnet_id, requested_at, &new_prices);
        self.pending_price_change(subnet_id).set(PriceChangeRequest {
            new_prices,
            requested_at,
        });
    }

    #[endpoint(applyChangedClusterPrice)]
    fn apply_changed_cluster_price(&self, subnet_id: u64) {
        let mut subnet = self.require_subnet(subnet_id);
        self.require_scope_authority(subnet_id, Role::PriceManager);
        require!(
            !self.pending_price_change(subnet_id).is_empty(),
            ERR_NO_PENDING_PRICE_CHANGE
        );

        let request = self.pending_price_change(subnet_id).get();
        let cooldown = self.timing_settings().get().price_change_cooldown;
        let now = self.blockchain().get_block_timestamp();
        require!(now >= request.requested_at + cooldown, ERR_COOLDOWN_NOT_OVER);

        subnet.unit_prices = request.new_prices;
        self.subnets(subnet_id).set(&subnet);
        self.pending_price_change(subnet_id).clear();
        self.price_change_applied_event(subnet_id, &subnet.unit_prices);
    }

    // ========================================================
    // Collateral custody and stake
    // ========================================================

    /// Moves locked collateral NFTs to the caller. The subnets and clusters
    /// they once backed are left untouched.
    #[endpoint(withdrawNFT)]
    fn withdraw_nft(&self, nonces: MultiValueEncoded<u64>) {
        self.require_scope_authority(GLOBAL_SCOPE, Role::CustodyManager);
        let caller = self.blockchain().get_caller();

        let nonces = nonces.to_vec();
        for nonce in nonces.iter() {
            require!(
                self.locked_collateral().swap_remove(&nonce),
                ERR_COLLATERAL_NOT_LOCKED
            );
        }

        for nonce in nonces.iter() {
            self.return_nft(&caller, nonce);
            self.collateral_withdrawn_event(&caller, nonce);
        }
    }

    /// Slashes part of a cluster's stake to the caller. Never refunded.
    #[endpoint(withdrawStackFromClusterByDAO)]
    fn withdraw_stack_from_cluster_by_dao(&self, subnet_id: u64, cluster_id: u64, amount: BigUint) {
        self.require_subnet(subnet_id);
        self.require_scope_authority(subnet_id, Role::StakeManager);
        let mut cluster = self.require_cluster(subnet_id, cluster_id);
        require!(
            amount > 0u64 && amount <= cluster.stake,
            ERR_INSUFFICIENT_FUNDS
        );

        cluster.stake -= &amount;
        self.clusters(subnet_id, cluster_id).set(&cluster);
        self.stake_locked(&cluster.owner)
            .update(|locked| *locked -= &amount);

        let caller = self.blockchain().get_caller();
        self.pay_out(&caller, &amount);
        self.stake_slashed_event(subnet_id, cluster_id, &caller, &amount);
    }

    #[endpoint(withdrawClusterStake)]
    fn withdraw_cluster_stake(&self, subnet_id: u64, cluster_id: u64) -> BigUint {
        let caller = self.blockchain().get_caller();
        let mut cluster = self.require_cluster(subnet_id, cluster_id);
        require!(cluster.owner == caller, ERR_UNAUTHORIZED);
        require!(
            cluster.status == ClusterStatus::Delisted,
            ERR_CLUSTER_NOT_DELISTED
        );

        let amount = core::mem::replace(&mut cluster.stake, BigUint::zero());
        require!(amount > 0u64, ERR_NOTHING_TO_CLAIM);

        self.clusters(subnet_id, cluster_id).set(&cluster);
        self.stake_locked(&caller).update(|locked| *locked -= &amount);

        self.pay_out(&caller, &amount);
        self.stake_withdrawn_event(subnet_id, cluster_id, &caller, &amount);
        amount
    }

    // ========================================================
    // INTERNAL
    // ========================================================

    fn require_subnet(&self, subnet_id: u64) -> Subnet<Self::Api> {
        require!(!self.subnets(subnet_id).is_empty(), ERR_UNKNOWN_SUBNET);
        self.subnets(subnet_id).get()
    }

    fn require_cluster(&self, subnet_id: u64, cluster_id: u64) -> Cluster<Self::Api> {
        require!(
            !self.clusters(subnet_id, cluster_id).is_empty(),
            ERR_UNKNOWN_CLUSTER
        );
        self.clusters(subnet_id, cluster_id).get()
    }

    fn require_subnet_admin(&self, subnet: &Subnet<Self::Api>) {
        let caller = self.blockchain().get_caller();
        require!(
            caller == subnet.owner_dao || self.is_contract_owner(&caller),
            ERR_UNAUTHORIZED
        );
    }

    // ========================================================
    // VIEWS
    // ========================================================

    #[view(totalClusterSpotsAvailable)]
    fn total_cluster_spots_available(&self, subnet_id: u64) -> u64 {
        if self.subnets(subnet_id).is_empty() {
            return 0;
        }
        let max_clusters = self.subnets(subnet_id).get().max_clusters;
        max_clusters.saturating_sub(self.slots_used(subnet_id).get())
    }

    #[view(isWhitelisted)]
    fn is_whitelisted(&self, subnet_id: u64, account: &ManagedAddress) -> bool {
        self.find_entry(IndexKind::Whitelist, account, subnet_id)
            .is_some()
    }

    #[view(getWhitelist)]
    fn get_whitelist(&self, subnet_id: u64) -> MultiValueEncoded<ManagedAddress> {
        let mut result = MultiValueEncoded::new();
        for account in self.whitelist(subnet_id).iter() {
            result.push(account);
        }
        result
    }

    #[view(getClustersOfWallet)]
    fn get_clusters_of_wallet(&self, wallet: &ManagedAddress) -> MultiValueEncoded<MultiValue2<u64, u64>> {
        let mut result = MultiValueEncoded::new();
        for (subnet_id, cluster_id) in self.memberships(IndexKind::ClusterWallet, wallet).iter() {
            result.push((subnet_id, cluster_id).into());
        }
        result
    }

    #[view(getLockedCollateral)]
    fn get_locked_collateral(&self) -> MultiValueEncoded<u64> {
        let mut result = MultiValueEncoded::new();
        for nonce in self.locked_collateral().iter() {
            result.push(nonce);
        }
        result
    }

    #[view(getSubnet)]
    #[storage_mapper("subnets")]
    fn subnets(&self, subnet_id: u64) -> SingleValueMapper<Subnet<Self::Api>>;

    #[view(getSubnetCount)]
    #[storage_mapper("subnetCount")]
    fn subnet_count(&self) -> SingleValueMapper<u64>;

    #[view(getCluster)]
    #[storage_mapper("clusters")]
    fn clusters(&self, subnet_id: u64, cluster_id: u64) -> SingleValueMapper<Cluster<Self::Api>>;

    #[view(getClusterCount)]
    #[storage_mapper("clusterCount")]
    fn cluster_count(&self, subnet_id: u64) -> SingleValueMapper<u64>;

    #[view(getSlotsUsed)]
    #[storage_mapper("slotsUsed")]
    fn slots_used(&self, subnet_id: u64) -> SingleValueMapper<u64>;

    #[view(getPendingPriceChange)]
    #[storage_mapper("pendingPriceChange")]
    fn pending_price_change(&self, subnet_id: u64) -> SingleValueMapper<PriceChangeRequest<Self::Api>>;

    #[view(balanceOfStackLocked)]
    #[storage_mapper("stakeLocked")]
    fn stake_locked(&self, owner: &ManagedAddress) -> SingleValueMapper<BigUint>;

    #[storage_mapper("whitelist")]
    fn whitelist(&self, subnet_id: u64) -> VecMapper<ManagedAddress>;

    #[storage_mapper("lockedCollateral")]
    fn locked_collateral(&self) -> UnorderedSetMapper<u64>;
}
