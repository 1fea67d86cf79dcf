multiversx_sc::imports!();

use crate::config::{self, PERCENT_DENOMINATOR};
use crate::distributor;
use crate::errors::*;
use crate::events;
use crate::membership;
use crate::pools;
use crate::registry;
use crate::roles::{self, GLOBAL_SCOPE};
use crate::types::{
    FeeRates, RevenueSplit, Role, Subnet, SubscriptionRecord, SupportOverride,
};

// ============================================================
// Pure pricing
// ============================================================

/// Σ unit_prices[i] · compute_vector[i]
pub fn compute_cost_per_sec<M: ManagedTypeApi>(
    unit_prices: &ManagedVec<M, BigUint<M>>,
    compute_vector: &ManagedVec<M, u64>,
) -> BigUint<M> {
    let mut cost = BigUint::zero();
    for (price, units) in unit_prices.iter().zip(compute_vector.iter()) {
        let price: &BigUint<M> = &price;
        cost += &(price * units);
    }
    cost
}

/// licenseFee + computeCost · (100000 + dao + support + referral) / 100000,
/// truncated. The truncated remainder is never billed.
pub fn drip_rate_per_sec<M: ManagedTypeApi>(
    license_fee: &BigUint<M>,
    compute_cost: &BigUint<M>,
    rates: &FeeRates,
) -> BigUint<M> {
    let scaled = compute_cost * (PERCENT_DENOMINATOR + rates.sum()) / PERCENT_DENOMINATOR;
    license_fee + &scaled
}

/// Splits what was actually drawn for the interval (from, to] of `record`.
///
/// Every slice is a whole number of per-second units; the treasury takes
/// the per-second rounding left over by the other slices, the referral
/// slice of seconds after the referral expiry, and any slice whose
/// beneficiary is unset. If less than the full cost was drawn, each slice
/// is scaled down and the treasury again takes the remainder, so the
/// slices always add up to `drawn`.
pub fn split_interval<M: ManagedTypeApi>(
    record: &SubscriptionRecord<M>,
    from: u64,
    to: u64,
    drawn: &BigUint<M>,
) -> RevenueSplit<M> {
    let elapsed = to.saturating_sub(from);
    let referral_secs = if record.referral_address.is_zero() || record.referral_expiry <= from {
        0
    } else {
        core::cmp::min(to, record.referral_expiry) - from
    };

    let cost = &record.compute_cost_per_sec;
    let support_per_sec = if record.support_address.is_zero() {
        BigUint::zero()
    } else {
        cost * record.fee_rates.support_percent / PERCENT_DENOMINATOR
    };
    let referral_per_sec = cost * record.fee_rates.referral_percent / PERCENT_DENOMINATOR;
    let license_per_sec = if record.license_address.is_zero() {
        BigUint::zero()
    } else {
        record.license_fee.clone()
    };

    let due = &record.drip_rate_per_sec * elapsed;
    let mut split = RevenueSplit {
        compute: cost * elapsed,
        license: license_per_sec * elapsed,
        support: support_per_sec * elapsed,
        referral: referral_per_sec * referral_secs,
        treasury: BigUint::zero(),
    };

    if *drawn < due {
        split.compute = split.compute * drawn / &due;
        split.license = split.license * drawn / &due;
        split.support = split.support * drawn / &due;
        split.referral = split.referral * drawn / &due;
    }

    let mut assigned = split.compute.clone();
    assigned += &split.license;
    assigned += &split.support;
    assigned += &split.referral;
    split.treasury = drawn - &assigned;
    split
}

// ============================================================
// Module
// ============================================================

#[multiversx_sc::module]
pub trait RateCalculatorModule:
    config::ConfigModule
    + events::EventsModule
    + membership::MembershipModule
    + roles::RolesModule
    + pools::RevenuePoolsModule
    + distributor::RevenueDistributorModule
    + registry::ResourceRegistryModule
{
    /// One-time support override for an NFT. Until registered, records
    /// use the default support address and fee.
    #[endpoint(registerSupportFor)]
    fn register_support_for(&self, nft_id: u64, support_address: ManagedAddress, fee_percent: u64) {
        self.require_scope_authority(GLOBAL_SCOPE, Role::SupportManager);
        require!(!support_address.is_zero(), ERR_ZERO_ADDRESS);
        require!(fee_percent <= PERCENT_DENOMINATOR, ERR_INVALID_PERCENTAGE);
        require!(
            self.support_override(nft_id).is_empty(),
            ERR_SUPPORT_ALREADY_REGISTERED
        );

        self.support_override(nft_id).set(SupportOverride {
            address: support_address.clone(),
            fee_percent,
        });
        self.support_registered_event(nft_id, &support_address, fee_percent);
    }

    // ========================================================
    // VIEWS
    // ========================================================

    #[view(computeCostPerSec)]
    fn compute_cost_per_sec_view(&self, subnet_id: u64, compute_vector: ManagedVec<u64>) -> BigUint {
        let subnet = self.require_subnet(subnet_id);
        require!(
            compute_vector.len() == subnet.unit_prices.len(),
            ERR_LENGTH_MISMATCH
        );
        compute_cost_per_sec(&subnet.unit_prices, &compute_vector)
    }

    #[view(estimateDripRatePerSec)]
    fn estimate_drip_rate_per_sec(
        &self,
        subnet_id: u64,
        nft_id: u64,
        license_fee: BigUint,
        compute_vector: ManagedVec<u64>,
    ) -> BigUint {
        let subnet = self.require_subnet(subnet_id);
        require!(
            compute_vector.len() == subnet.unit_prices.len(),
            ERR_LENGTH_MISMATCH
        );
        let cost = compute_cost_per_sec(&subnet.unit_prices, &compute_vector);
        let (rates, _) = self.fee_rates_for(nft_id, &subnet);
        drip_rate_per_sec(&license_fee, &cost, &rates)
    }

    #[view(getSupportFor)]
    fn get_support_for(&self, nft_id: u64, subnet_id: u64) -> MultiValue2<ManagedAddress, u64> {
        let subnet = self.require_subnet(subnet_id);
        let (rates, support_address) = self.fee_rates_for(nft_id, &subnet);
        (support_address, rates.support_percent).into()
    }

    // ========================================================
    // INTERNAL: pricing and fan-out
    // ========================================================

    /// Support fee precedence: the NFT's registered override, then the
    /// subnet's own rate when set, then the global default.
    fn fee_rates_for(&self, nft_id: u64, subnet: &Subnet<Self::Api>) -> (FeeRates, ManagedAddress) {
        let fees = self.fee_settings().get();
        let (support_address, support_percent) = if self.support_override(nft_id).is_empty() {
            let percent = if subnet.support_fee_rate > 0 {
                subnet.support_fee_rate
            } else {
                fees.support_fee_percent
            };
            (self.default_support_address().get(), percent)
        } else {
            let support = self.support_override(nft_id).get();
            (support.address, support.fee_percent)
        };

        let rates = FeeRates {
            dao_rate: fees.dao_rate,
            support_percent,
            referral_percent: fees.referral_percent,
        };
        (rates, support_address)
    }

    /// Builds a record priced at the subnet's current prices and the
    /// current fee settings, starting to accrue at `now`.
    fn price_record(
        &self,
        nft_id: u64,
        subnet: &Subnet<Self::Api>,
        service_provider: ManagedAddress,
        referral_address: ManagedAddress,
        license_address: ManagedAddress,
        license_fee: BigUint,
        compute_vector: ManagedVec<u64>,
        now: u64,
    ) -> SubscriptionRecord<Self::Api> {
        require!(
            compute_vector.len() == subnet.unit_prices.len(),
            ERR_LENGTH_MISMATCH
        );

        let compute_cost = compute_cost_per_sec(&subnet.unit_prices, &compute_vector);
        let (fee_rates, support_address) = self.fee_rates_for(nft_id, subnet);
        let drip_rate = drip_rate_per_sec(&license_fee, &compute_cost, &fee_rates);
        let referral_expiry_secs = self.fee_settings().get().referral_expiry_secs;

        SubscriptionRecord {
            nft_id,
            subnet_id: subnet.id,
            service_provider,
            referral_address,
            license_address,
            support_address,
            license_fee,
            compute_vector,
            compute_cost_per_sec: compute_cost,
            fee_rates,
            drip_rate_per_sec: drip_rate,
            subscribed_at: now,
            referral_expiry: now + referral_expiry_secs,
            last_settle_time: now,
        }
    }

    fn fan_out(&self, record: &SubscriptionRecord<Self::Api>, to: u64, drawn: &BigUint) {
        if *drawn == 0u64 {
            return;
        }
        let split = split_interval(record, record.last_settle_time, to, drawn);
        self.credit_split(
            record.subnet_id,
            &record.license_address,
            &record.support_address,
            &record.referral_address,
            &split,
        );
    }

    // ========================================================
    // STORAGE
    // ========================================================

    #[view(getSubscription)]
    #[storage_mapper("subscription")]
    fn subscription(&self, nft_id: u64, subnet_id: u64) -> SingleValueMapper<SubscriptionRecord<Self::Api>>;

    #[storage_mapper("nftSubnets")]
    fn nft_subnets(&self, nft_id: u64) -> UnorderedSetMapper<u64>;

    #[storage_mapper("supportOverride")]
    fn support_override(&self, nft_id: u64) -> SingleValueMapper<SupportOverride<Self::Api>>;
}
