multiversx_sc::imports!();

use crate::types::{BalanceTier, ClusterStatus, Role};

#[multiversx_sc::module]
pub trait EventsModule {
    // ── Configuration and roles ──

    #[event("configChanged")]
    fn config_changed_event(&self, #[indexed] key: &ManagedBuffer);

    #[event("roleGranted")]
    fn role_granted_event(
        &self,
        #[indexed] scope: u64,
        #[indexed] role: Role,
        #[indexed] account: &ManagedAddress,
    );

    #[event("roleRevoked")]
    fn role_revoked_event(
        &self,
        #[indexed] scope: u64,
        #[indexed] role: Role,
        #[indexed] account: &ManagedAddress,
    );

    // ── Registry ──

    #[event("subnetCreated")]
    fn subnet_created_event(
        &self,
        #[indexed] subnet_id: u64,
        #[indexed] owner_dao: &ManagedAddress,
        #[indexed] collateral_nonce: u64,
        fee: &BigUint,
    );

    #[event("subnetListingChanged")]
    fn subnet_listing_changed_event(&self, #[indexed] subnet_id: u64, #[indexed] listed: bool);

    #[event("subnetAttributesChanged")]
    fn subnet_attributes_changed_event(&self, #[indexed] subnet_id: u64, max_clusters: u64);

    #[event("clusterSignedUp")]
    fn cluster_signed_up_event(
        &self,
        #[indexed] subnet_id: u64,
        #[indexed] cluster_id: u64,
        #[indexed] owner: &ManagedAddress,
        #[indexed] status: ClusterStatus,
        stake: &BigUint,
    );

    #[event("clusterStatusChanged")]
    fn cluster_status_changed_event(
        &self,
        #[indexed] subnet_id: u64,
        #[indexed] cluster_id: u64,
        #[indexed] status: ClusterStatus,
    );

    #[event("whitelistUpdated")]
    fn whitelist_updated_event(
        &self,
        #[indexed] subnet_id: u64,
        #[indexed] account: &ManagedAddress,
        #[indexed] index: usize,
        added: bool,
    );

    #[event("priceChangeRequested")]
    fn price_change_requested_event(
        &self,
        #[indexed] subnet_id: u64,
        #[indexed] requested_at: u64,
        new_prices: &ManagedVec<BigUint>,
    );

    #[event("priceChangeApplied")]
    fn price_change_applied_event(&self, #[indexed] subnet_id: u64, prices: &ManagedVec<BigUint>);

    #[event("collateralWithdrawn")]
    fn collateral_withdrawn_event(&self, #[indexed] to: &ManagedAddress, #[indexed] nonce: u64);

    #[event("stakeSlashed")]
    fn stake_slashed_event(
        &self,
        #[indexed] subnet_id: u64,
        #[indexed] cluster_id: u64,
        #[indexed] receiver: &ManagedAddress,
        amount: &BigUint,
    );

    #[event("stakeWithdrawn")]
    fn stake_withdrawn_event(
        &self,
        #[indexed] subnet_id: u64,
        #[indexed] cluster_id: u64,
        #[indexed] owner: &ManagedAddress,
        amount: &BigUint,
    );

    // ── Revenue ──

    #[event("revenueClaimed")]
    fn revenue_claimed_event(&self, #[indexed] beneficiary: &ManagedAddress, amount: &BigUint);

    #[event("subnetRevenueCommitted")]
    fn subnet_revenue_committed_event(
        &self,
        #[indexed] subnet_id: u64,
        #[indexed] generation: u64,
        amount: &BigUint,
    );

    #[event("clusterRevenueClaimed")]
    fn cluster_revenue_claimed_event(
        &self,
        #[indexed] wallet: &ManagedAddress,
        #[indexed] subnet_id: u64,
        #[indexed] cluster_id: u64,
        amount: &BigUint,
    );

    #[event("weightUpdated")]
    fn weight_updated_event(
        &self,
        #[indexed] subnet_id: u64,
        #[indexed] cluster_id: u64,
        #[indexed] generation: u64,
        weight: u64,
    );

    #[event("supportRegistered")]
    fn support_registered_event(
        &self,
        #[indexed] nft_id: u64,
        #[indexed] support_address: &ManagedAddress,
        fee_percent: u64,
    );

    // ── Ledger ──

    #[event("balanceDeposited")]
    fn balance_deposited_event(
        &self,
        #[indexed] nft_id: u64,
        #[indexed] depositor: &ManagedAddress,
        #[indexed] tier: BalanceTier,
        amount: &BigUint,
    );

    #[event("balanceWithdrawn")]
    fn balance_withdrawn_event(
        &self,
        #[indexed] nft_id: u64,
        #[indexed] receiver: &ManagedAddress,
        #[indexed] tier: BalanceTier,
        amount: &BigUint,
    );

    #[event("balanceSettled")]
    fn balance_settled_event(
        &self,
        #[indexed] nft_id: u64,
        #[indexed] settled_at: u64,
        depleted: &BigUint,
    );

    // ── Subscriptions ──

    #[event("subscriptionCreated")]
    fn subscription_created_event(
        &self,
        #[indexed] nft_id: u64,
        #[indexed] subnet_id: u64,
        drip_rate_per_sec: &BigUint,
    );

    #[event("subscriptionClosed")]
    fn subscription_closed_event(&self, #[indexed] nft_id: u64, #[indexed] subnet_id: u64);

    #[event("subscriptionMoved")]
    fn subscription_moved_event(
        &self,
        #[indexed] nft_id: u64,
        #[indexed] from_subnet: u64,
        #[indexed] to_subnet: u64,
    );

    #[event("dripRateSynced")]
    fn drip_rate_synced_event(
        &self,
        #[indexed] nft_id: u64,
        #[indexed] subnet_id: u64,
        drip_rate_per_sec: &BigUint,
    );

    #[event("serviceProviderChangeRequested")]
    fn service_provider_change_requested_event(
        &self,
        #[indexed] nft_id: u64,
        #[indexed] subnet_id: u64,
        #[indexed] new_provider: &ManagedAddress,
    );

    #[event("serviceProviderChanged")]
    fn service_provider_changed_event(
        &self,
        #[indexed] nft_id: u64,
        #[indexed] subnet_id: u64,
        #[indexed] new_provider: &ManagedAddress,
    );
}
