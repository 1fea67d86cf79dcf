multiversx_sc::imports!();

use crate::config;
use crate::errors::*;
use crate::events;
use crate::types::RevenueSplit;

/// Unclaimed revenue pools. Amounts only move in here on settlement
/// and only leave through a whole-pool claim.
#[multiversx_sc::module]
pub trait RevenuePoolsModule: config::ConfigModule + events::EventsModule {
    /// Pays the caller's entire pool and zeroes it. No partial claims.
    #[endpoint(claimRevenue)]
    fn claim_revenue(&self) -> BigUint {
        let caller = self.blockchain().get_caller();
        let amount = self.revenue_pool(&caller).take();
        require!(amount > 0u64, ERR_NOTHING_TO_CLAIM);

        self.pay_out(&caller, &amount);
        self.revenue_claimed_event(&caller, &amount);
        amount
    }

    #[view(getRevenuePool)]
    fn get_revenue_pool(&self, beneficiary: &ManagedAddress) -> BigUint {
        self.revenue_pool(beneficiary).get()
    }

    #[view(getSubnetPool)]
    fn get_subnet_pool(&self, subnet_id: u64) -> BigUint {
        self.subnet_pool(subnet_id).get()
    }

    // ========================================================
    // INTERNAL: crediting
    // ========================================================

    fn credit_pool(&self, beneficiary: &ManagedAddress, amount: &BigUint) {
        if *amount > 0u64 {
            self.revenue_pool(beneficiary).update(|pool| *pool += amount);
        }
    }

    fn credit_treasury(&self, amount: &BigUint) {
        let dao = self.dao_address().get();
        self.credit_pool(&dao, amount);
    }

    /// Routes one settled interval. Slices without a beneficiary were
    /// already folded into the treasury slice by the splitter.
    fn credit_split(
        &self,
        subnet_id: u64,
        license_address: &ManagedAddress,
        support_address: &ManagedAddress,
        referral_address: &ManagedAddress,
        split: &RevenueSplit<Self::Api>,
    ) {
        if split.compute > 0u64 {
            self.subnet_pool(subnet_id).update(|pool| *pool += &split.compute);
        }
        self.credit_pool(license_address, &split.license);
        self.credit_pool(support_address, &split.support);
        self.credit_pool(referral_address, &split.referral);
        self.credit_treasury(&split.treasury);
    }

    #[storage_mapper("revenuePool")]
    fn revenue_pool(&self, beneficiary: &ManagedAddress) -> SingleValueMapper<BigUint>;

    #[storage_mapper("subnetPool")]
    fn subnet_pool(&self, subnet_id: u64) -> SingleValueMapper<BigUint>;
}
