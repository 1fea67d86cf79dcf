multiversx_sc::imports!();

use crate::errors::*;
use crate::events;
use crate::types::{FeeSettings, TimingSettings};

/// Percentages are integers out of this denominator.
pub const PERCENT_DENOMINATOR: u64 = 100_000;

/// Unit price slots per subnet: one per resource type.
pub const RESOURCE_TYPES: usize = 4;

/// Payments attached to a call, split by what the contract accepts.
pub struct AttachedPayments<M: ManagedTypeApi> {
    pub nft_nonce: Option<u64>,
    pub amount: BigUint<M>,
}

#[multiversx_sc::module]
pub trait ConfigModule: events::EventsModule {
    // ========================================================
    // Owner setters, applied to records priced afterwards
    // ========================================================

    #[only_owner]
    #[endpoint(setFeeSettings)]
    fn set_fee_settings(&self, fees: FeeSettings) {
        self.validate_fee_settings(&fees);
        self.fee_settings().set(fees);
        self.config_changed_event(&ManagedBuffer::new_from_bytes(b"feeSettings"));
    }

    #[only_owner]
    #[endpoint(setTimingSettings)]
    fn set_timing_settings(&self, timing: TimingSettings) {
        self.timing_settings().set(timing);
        self.config_changed_event(&ManagedBuffer::new_from_bytes(b"timingSettings"));
    }

    #[only_owner]
    #[endpoint(setDaoAddress)]
    fn set_dao_address(&self, dao_address: ManagedAddress) {
        require!(!dao_address.is_zero(), ERR_ZERO_ADDRESS);
        self.dao_address().set(&dao_address);
        self.config_changed_event(&ManagedBuffer::new_from_bytes(b"daoAddress"));
    }

    #[only_owner]
    #[endpoint(setDefaultSupportAddress)]
    fn set_default_support_address(&self, support_address: ManagedAddress) {
        require!(!support_address.is_zero(), ERR_ZERO_ADDRESS);
        self.default_support_address().set(&support_address);
        self.config_changed_event(&ManagedBuffer::new_from_bytes(b"defaultSupportAddress"));
    }

    #[only_owner]
    #[endpoint(setSubnetCreationFee)]
    fn set_subnet_creation_fee(&self, fee: BigUint) {
        self.subnet_creation_fee().set(&fee);
        self.config_changed_event(&ManagedBuffer::new_from_bytes(b"subnetCreationFee"));
    }

    #[only_owner]
    #[endpoint(setMaxSubnetsPerNft)]
    fn set_max_subnets_per_nft(&self, max_subnets: u64) {
        require!(max_subnets > 0, ERR_INVALID_CAPACITY);
        self.max_subnets_per_nft().set(max_subnets);
        self.config_changed_event(&ManagedBuffer::new_from_bytes(b"maxSubnetsPerNft"));
    }

    // ========================================================
    // INTERNAL: validation and payments
    // ========================================================

    fn validate_fee_settings(&self, fees: &FeeSettings) {
        require!(
            fees.dao_rate <= PERCENT_DENOMINATOR
                && fees.referral_percent <= PERCENT_DENOMINATOR
                && fees.support_fee_percent <= PERCENT_DENOMINATOR,
            ERR_INVALID_PERCENTAGE
        );
    }

    /// Accepts at most one NFT of the configured collection plus any
    /// number of billing-token transfers. Anything else is rejected.
    fn attached_payments(&self) -> AttachedPayments<Self::Api> {
        require!(
            self.call_value().egld_value().clone_value() == 0u64,
            ERR_INVALID_PAYMENT
        );

        let nft_token = self.nft_token().get();
        let billing_token = self.billing_token().get();
        let mut attached = AttachedPayments {
            nft_nonce: None,
            amount: BigUint::zero(),
        };

        let payments = self.call_value().all_esdt_transfers();
        for payment in payments.iter() {
            if payment.token_identifier == nft_token && payment.token_nonce > 0 {
                require!(attached.nft_nonce.is_none(), ERR_INVALID_PAYMENT);
                require!(payment.amount == 1u64, ERR_INVALID_PAYMENT);
                attached.nft_nonce = Some(payment.token_nonce);
            } else if payment.token_identifier == billing_token {
                attached.amount += &payment.amount;
            } else {
                sc_panic!(ERR_INVALID_PAYMENT);
            }
        }

        attached
    }

    /// The caller proves it holds `nft_id` by attaching it.
    fn require_nft_attached(&self, attached: &AttachedPayments<Self::Api>, nft_id: u64) {
        require!(attached.nft_nonce == Some(nft_id), ERR_NOT_OWNER);
    }

    fn return_nft(&self, to: &ManagedAddress, nft_id: u64) {
        self.send()
            .direct_esdt(to, &self.nft_token().get(), nft_id, &BigUint::from(1u64));
    }

    fn pay_out(&self, to: &ManagedAddress, amount: &BigUint) {
        if *amount > 0u64 {
            self.send()
                .direct_esdt(to, &self.billing_token().get(), 0, amount);
        }
    }

    fn is_contract_owner(&self, address: &ManagedAddress) -> bool {
        *address == self.blockchain().get_owner_address()
    }

    // ========================================================
    // VIEWS
    // ========================================================

    #[view(getFeeSettings)]
    #[storage_mapper("feeSettings")]
    fn fee_settings(&self) -> SingleValueMapper<FeeSettings>;

    #[view(getTimingSettings)]
    #[storage_mapper("timingSettings")]
    fn timing_settings(&self) -> SingleValueMapper<TimingSettings>;

    #[view(getBillingToken)]
    #[storage_mapper("billingToken")]
    fn billing_token(&self) -> SingleValueMapper<TokenIdentifier>;

    #[view(getNftToken)]
    #[storage_mapper("nftToken")]
    fn nft_token(&self) -> SingleValueMapper<TokenIdentifier>;

    #[view(getDaoAddress)]
    #[storage_mapper("daoAddress")]
    fn dao_address(&self) -> SingleValueMapper<ManagedAddress>;

    #[view(getDefaultSupportAddress)]
    #[storage_mapper("defaultSupportAddress")]
    fn default_support_address(&self) -> SingleValueMapper<ManagedAddress>;

    #[view(getSubnetCreationFee)]
    #[storage_mapper("subnetCreationFee")]
    fn subnet_creation_fee(&self) -> SingleValueMapper<BigUint>;

    #[view(getMaxSubnetsPerNft)]
    #[storage_mapper("maxSubnetsPerNft")]
    fn max_subnets_per_nft(&self) -> SingleValueMapper<u64>;
}
