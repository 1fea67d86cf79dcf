multiversx_sc::imports!();

use crate::config;
use crate::distributor;
use crate::errors::*;
use crate::events;
use crate::ledger;
use crate::membership;
use crate::pools;
use crate::rate;
use crate::registry;
use crate::roles;
use crate::types::{ServiceProviderChange, SubscriptionRecord};

#[multiversx_sc::module]
pub trait SubscriptionModule:
    config::ConfigModule
    + events::EventsModule
    + membership::MembershipModule
    + roles::RolesModule
    + pools::RevenuePoolsModule
    + distributor::RevenueDistributorModule
    + registry::ResourceRegistryModule
    + rate::RateCalculatorModule
    + ledger::BalanceLedgerModule
{
    // ========================================================
    // ENDPOINT: createSubscription
    // NFT round trip; attached billing tokens go to the owned tier.
    // ========================================================

    #[payable("*")]
    #[endpoint(createSubscription)]
    fn create_subscription(
        &self,
        nft_id: u64,
        subnet_id: u64,
        service_provider: ManagedAddress,
        referral_address: ManagedAddress,
        license_address: ManagedAddress,
        license_fee: BigUint,
        compute_vector: ManagedVec<u64>,
    ) -> BigUint {
        let caller = self.blockchain().get_caller();
        let attached = self.attached_payments();
        self.require_nft_attached(&attached, nft_id);

        self.settle(nft_id);
        self.deposit_owned(nft_id, &caller, &attached.amount);

        let now = self.blockchain().get_block_timestamp();
        let drip_rate = self.open_record(
            nft_id,
            subnet_id,
            service_provider,
            referral_address,
            license_address,
            license_fee,
            compute_vector,
            now,
        );
        self.require_min_funding(nft_id);

        self.return_nft(&caller, nft_id);
        drip_rate
    }

    /// Same as `createSubscription` for several subnets at once. The three
    /// lists are read position by position and must have equal lengths.
    #[payable("*")]
    #[endpoint(createSubscriptionsBatch)]
    fn create_subscriptions_batch(
        &self,
        nft_id: u64,
        service_provider: ManagedAddress,
        referral_address: ManagedAddress,
        license_address: ManagedAddress,
        subnet_ids: ManagedVec<u64>,
        license_fees: ManagedVec<BigUint>,
        compute_vectors: ManagedVec<ManagedVec<u64>>,
    ) {
        require!(
            !subnet_ids.is_empty()
                && subnet_ids.len() == license_fees.len()
                && subnet_ids.len() == compute_vectors.len(),
            ERR_LENGTH_MISMATCH
        );

        let caller = self.blockchain().get_caller();
        let attached = self.attached_payments();
        self.require_nft_attached(&attached, nft_id);

        self.settle(nft_id);
        self.deposit_owned(nft_id, &caller, &attached.amount);

        let now = self.blockchain().get_block_timestamp();
        for i in 0..subnet_ids.len() {
            let license_fee: &BigUint = &license_fees.get(i);
            let compute_vector: &ManagedVec<u64> = &compute_vectors.get(i);
            self.open_record(
                nft_id,
                subnet_ids.get(i),
                service_provider.clone(),
                referral_address.clone(),
                license_address.clone(),
                license_fee.clone(),
                compute_vector.clone(),
                now,
            );
        }
        self.require_min_funding(nft_id);

        self.return_nft(&caller, nft_id);
    }

    /// Settles and drops the record. Balances stay with the NFT.
    #[payable("*")]
    #[endpoint(closeSubscription)]
    fn close_subscription(&self, nft_id: u64, subnet_id: u64) {
        let caller = self.require_holder_call(nft_id);
        self.require_subscribed(nft_id, subnet_id);
        self.settle(nft_id);

        self.close_record(nft_id, subnet_id);
        self.subscription_closed_event(nft_id, subnet_id);

        self.return_nft(&caller, nft_id);
    }

    /// Moves a record off a delisted subnet. Resources, license, referral
    /// and provider carry over with the referral window and the provider
    /// change cooldown; the rate is re-priced at the target subnet.
    #[payable("*")]
    #[endpoint(changeSubnet)]
    fn change_subnet(&self, nft_id: u64, from_subnet: u64, to_subnet: u64) -> BigUint {
        let caller = self.require_holder_call(nft_id);
        let old = self.require_subscribed(nft_id, from_subnet);
        let source = self.require_subnet(from_subnet);
        require!(!source.listed, ERR_SUBNET_NOT_DELISTED);

        self.settle(nft_id);
        let last_change = self.last_provider_change(nft_id, from_subnet);
        let last_change_at = (!last_change.is_empty()).then(|| last_change.get());
        self.close_record(nft_id, from_subnet);

        let now = self.blockchain().get_block_timestamp();
        let drip_rate = self.open_record(
            nft_id,
            to_subnet,
            old.service_provider.clone(),
            old.referral_address.clone(),
            old.license_address.clone(),
            old.license_fee.clone(),
            old.compute_vector.clone(),
            now,
        );
        self.subscription(nft_id, to_subnet).update(|record| {
            record.subscribed_at = old.subscribed_at;
            record.referral_expiry = old.referral_expiry;
        });
        if let Some(changed_at) = last_change_at {
            self.last_provider_change(nft_id, to_subnet).set(changed_at);
        }
        self.subscription_moved_event(nft_id, from_subnet, to_subnet);

        self.return_nft(&caller, nft_id);
        drip_rate
    }

    /// Re-prices a record from the subnet's current prices and fee
    /// settings. Accrued time is settled at the old rate first; the
    /// referral window is kept.
    #[endpoint(syncDripRate)]
    fn sync_drip_rate(&self, nft_id: u64, subnet_id: u64) -> BigUint {
        let old = self.require_subscribed(nft_id, subnet_id);
        let subnet = self.require_subnet(subnet_id);
        self.settle(nft_id);

        let now = self.blockchain().get_block_timestamp();
        let mut record = self.price_record(
            nft_id,
            &subnet,
            old.service_provider,
            old.referral_address,
            old.license_address,
            old.license_fee,
            old.compute_vector,
            now,
        );
        record.subscribed_at = old.subscribed_at;
        record.referral_expiry = old.referral_expiry;

        self.subscription(nft_id, subnet_id).set(&record);
        self.drip_rate_synced_event(nft_id, subnet_id, &record.drip_rate_per_sec);
        record.drip_rate_per_sec
    }

    // ========================================================
    // Service provider change: notice, then cooldown
    // ========================================================

    #[payable("*")]
    #[endpoint(requestServiceProviderChange)]
    fn request_service_provider_change(
        &self,
        nft_id: u64,
        subnet_id: u64,
        new_provider: ManagedAddress,
    ) {
        let caller = self.require_holder_call(nft_id);
        self.require_subscribed(nft_id, subnet_id);
        require!(!new_provider.is_zero(), ERR_ZERO_ADDRESS);

        let now = self.blockchain().get_block_timestamp();
        let last_change = self.last_provider_change(nft_id, subnet_id);
        if !last_change.is_empty() {
            let cooldown = self.timing_settings().get().service_provider_cooldown;
            require!(now >= last_change.get() + cooldown, ERR_COOLDOWN_NOT_OVER);
        }

        self.pending_provider_change(nft_id, subnet_id)
            .set(ServiceProviderChange {
                new_provider: new_provider.clone(),
                requested_at: now,
            });
        self.service_provider_change_requested_event(nft_id, subnet_id, &new_provider);

        self.return_nft(&caller, nft_id);
    }

    #[payable("*")]
    #[endpoint(applyServiceProviderChange)]
    fn apply_service_provider_change(&self, nft_id: u64, subnet_id: u64) {
        let caller = self.require_holder_call(nft_id);
        let mut record = self.require_subscribed(nft_id, subnet_id);
        require!(
            !self.pending_provider_change(nft_id, subnet_id).is_empty(),
            ERR_NO_PENDING_PROVIDER_CHANGE
        );

        let change = self.pending_provider_change(nft_id, subnet_id).get();
        let notice = self.timing_settings().get().service_provider_notice;
        let now = self.blockchain().get_block_timestamp();
        require!(
            now >= change.requested_at + notice,
            ERR_CHANGE_NOTICE_NOT_ELAPSED
        );

        record.service_provider = change.new_provider;
        self.subscription(nft_id, subnet_id).set(&record);
        self.pending_provider_change(nft_id, subnet_id).clear();
        self.last_provider_change(nft_id, subnet_id).set(now);
        self.service_provider_changed_event(nft_id, subnet_id, &record.service_provider);

        self.return_nft(&caller, nft_id);
    }

    // ========================================================
    // INTERNAL
    // ========================================================

    fn open_record(
        &self,
        nft_id: u64,
        subnet_id: u64,
        service_provider: ManagedAddress,
        referral_address: ManagedAddress,
        license_address: ManagedAddress,
        license_fee: BigUint,
        compute_vector: ManagedVec<u64>,
        now: u64,
    ) -> BigUint {
        let subnet = self.require_subnet(subnet_id);
        require!(subnet.listed, ERR_SUBNET_NOT_LISTED);
        require!(!service_provider.is_zero(), ERR_ZERO_ADDRESS);
        require!(
            self.subscription(nft_id, subnet_id).is_empty(),
            ERR_ALREADY_SUBSCRIBED
        );
        require!(
            (self.nft_subnets(nft_id).len() as u64) < self.max_subnets_per_nft().get(),
            ERR_SUBSCRIPTION_LIMIT
        );

        let record = self.price_record(
            nft_id,
            &subnet,
            service_provider,
            referral_address,
            license_address,
            license_fee,
            compute_vector,
            now,
        );
        self.subscription(nft_id, subnet_id).set(&record);
        self.nft_subnets(nft_id).insert(subnet_id);
        self.subscription_created_event(nft_id, subnet_id, &record.drip_rate_per_sec);

        record.drip_rate_per_sec
    }

    fn close_record(&self, nft_id: u64, subnet_id: u64) {
        self.subscription(nft_id, subnet_id).clear();
        self.nft_subnets(nft_id).swap_remove(&subnet_id);
        self.pending_provider_change(nft_id, subnet_id).clear();
        self.last_provider_change(nft_id, subnet_id).clear();
    }

    fn require_subscribed(&self, nft_id: u64, subnet_id: u64) -> SubscriptionRecord<Self::Api> {
        require!(
            !self.subscription(nft_id, subnet_id).is_empty(),
            ERR_NOT_SUBSCRIBED
        );
        self.subscription(nft_id, subnet_id).get()
    }

    /// The settled balance must cover every active record for
    /// `min_time_funds` seconds.
    fn require_min_funding(&self, nft_id: u64) {
        let min_time_funds = self.timing_settings().get().min_time_funds;
        let mut rate_sum = BigUint::zero();
        for subnet_id in self.nft_subnets(nft_id).iter() {
            rate_sum += &self.subscription(nft_id, subnet_id).get().drip_rate_per_sec;
        }

        let total = self.get_balances(nft_id).total();
        require!(total >= rate_sum * min_time_funds, ERR_INSUFFICIENT_FUNDS);
    }

    // ========================================================
    // VIEWS
    // ========================================================

    #[view(getSubscribedSubnets)]
    fn get_subscribed_subnets(&self, nft_id: u64) -> MultiValueEncoded<u64> {
        let mut result = MultiValueEncoded::new();
        for subnet_id in self.nft_subnets(nft_id).iter() {
            result.push(subnet_id);
        }
        result
    }

    #[view(getPendingServiceProviderChange)]
    #[storage_mapper("pendingProviderChange")]
    fn pending_provider_change(
        &self,
        nft_id: u64,
        subnet_id: u64,
    ) -> SingleValueMapper<ServiceProviderChange<Self::Api>>;

    #[view(getLastServiceProviderChange)]
    #[storage_mapper("lastProviderChange")]
    fn last_provider_change(&self, nft_id: u64, subnet_id: u64) -> SingleValueMapper<u64>;
}
