#![no_std]

multiversx_sc::imports!();

pub mod config;
pub mod distributor;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod membership;
pub mod pools;
pub mod rate;
pub mod registry;
pub mod roles;
pub mod subscription;
pub mod types;

use errors::*;
use types::{FeeSettings, TimingSettings};

// ============================================================
// Contract
// ============================================================

/// Metered billing for a compute marketplace: subnets and clusters sell
/// capacity, subscribers prepay per NFT, and every settlement splits what
/// was drawn between clusters, license holders, referrers, support and
/// the DAO treasury.
#[multiversx_sc::contract]
pub trait ComputeBilling:
    config::ConfigModule
    + events::EventsModule
    + membership::MembershipModule
    + roles::RolesModule
    + pools::RevenuePoolsModule
    + distributor::RevenueDistributorModule
    + registry::ResourceRegistryModule
    + rate::RateCalculatorModule
    + ledger::BalanceLedgerModule
    + subscription::SubscriptionModule
{
    // ========================================================
    // Init / Upgrade
    // ========================================================

    #[init]
    fn init(
        &self,
        billing_token: TokenIdentifier,
        nft_token: TokenIdentifier,
        dao_address: ManagedAddress,
        support_address: ManagedAddress,
        subnet_creation_fee: BigUint,
        max_subnets_per_nft: u64,
        fees: FeeSettings,
        timing: TimingSettings,
    ) {
        require!(billing_token.is_valid_esdt_identifier(), ERR_INVALID_TOKEN);
        require!(nft_token.is_valid_esdt_identifier(), ERR_INVALID_TOKEN);
        require!(billing_token != nft_token, ERR_INVALID_TOKEN);
        require!(
            !dao_address.is_zero() && !support_address.is_zero(),
            ERR_ZERO_ADDRESS
        );
        require!(max_subnets_per_nft > 0, ERR_INVALID_CAPACITY);
        self.validate_fee_settings(&fees);

        self.billing_token().set(&billing_token);
        self.nft_token().set(&nft_token);
        self.dao_address().set(&dao_address);
        self.default_support_address().set(&support_address);
        self.subnet_creation_fee().set(&subnet_creation_fee);
        self.max_subnets_per_nft().set(max_subnets_per_nft);
        self.fee_settings().set(fees);
        self.timing_settings().set(timing);
    }

    #[upgrade]
    fn upgrade(&self) {}
}
