multiversx_sc::imports!();

use crate::config;
use crate::distributor;
use crate::errors::*;
use crate::events;
use crate::membership;
use crate::pools;
use crate::rate;
use crate::registry;
use crate::roles;
use crate::types::{BalanceTier, BalanceTiers, CreditDeposit};

/// Per-NFT balances in three tiers, depleted lazily: nothing accrues in
/// storage until some call settles the NFT. Every mutating entry point
/// settles first, then changes balances, then transfers.
#[multiversx_sc::module]
pub trait BalanceLedgerModule:
    config::ConfigModule
    + events::EventsModule
    + membership::MembershipModule
    + roles::RolesModule
    + pools::RevenuePoolsModule
    + distributor::RevenueDistributorModule
    + registry::ResourceRegistryModule
    + rate::RateCalculatorModule
{
    // ========================================================
    // Deposits
    // ========================================================

    #[payable("*")]
    #[endpoint(addBalance)]
    fn add_balance(&self, nft_id: u64) {
        let amount = self.billing_payment();
        self.settle(nft_id);

        let caller = self.blockchain().get_caller();
        self.deposit_owned(nft_id, &caller, &amount);
    }

    /// Credit is spent first, oldest deposit first. The depositor may take
    /// back what is left of it once `expiry` is reached.
    #[payable("*")]
    #[endpoint(addBalanceAsCredit)]
    fn add_balance_as_credit(&self, nft_id: u64, expiry: u64) {
        let amount = self.billing_payment();
        let now = self.blockchain().get_block_timestamp();
        require!(expiry > now, ERR_INVALID_EXPIRY);
        self.settle(nft_id);

        let caller = self.blockchain().get_caller();
        self.credit_deposits(nft_id).push(&CreditDeposit {
            depositor: caller.clone(),
            remaining: amount.clone(),
            expiry,
            deposited_at: now,
        });
        self.credit_balance(nft_id).update(|credit| *credit += &amount);
        self.balance_deposited_event(nft_id, &caller, BalanceTier::Credit, &amount);
    }

    #[payable("*")]
    #[endpoint(addBalanceAsExternalDeposit)]
    fn add_balance_as_external_deposit(&self, nft_id: u64) {
        let amount = self.billing_payment();
        self.settle(nft_id);

        let caller = self.blockchain().get_caller();
        self.external_balance(nft_id).update(|external| *external += &amount);
        self.balance_deposited_event(nft_id, &caller, BalanceTier::External, &amount);
    }

    // ========================================================
    // Withdrawals: the holder attaches the NFT and gets it back
    // ========================================================

    #[payable("*")]
    #[endpoint(withdrawBalance)]
    fn withdraw_balance(&self, nft_id: u64, amount: BigUint) {
        let caller = self.require_holder_call(nft_id);
        self.settle(nft_id);

        let owned = self.owned_balance(nft_id).get();
        require!(amount > 0u64 && amount <= owned, ERR_INSUFFICIENT_FUNDS);
        self.owned_balance(nft_id).set(&(owned - &amount));

        self.return_nft(&caller, nft_id);
        self.pay_out(&caller, &amount);
        self.balance_withdrawn_event(nft_id, &caller, BalanceTier::Owned, &amount);
    }

    #[payable("*")]
    #[endpoint(withdrawAllOwnerBalance)]
    fn withdraw_all_owner_balance(&self, nft_id: u64) -> BigUint {
        let caller = self.require_holder_call(nft_id);
        self.settle(nft_id);

        let amount = self.owned_balance(nft_id).take();
        require!(amount > 0u64, ERR_INSUFFICIENT_FUNDS);

        self.return_nft(&caller, nft_id);
        self.pay_out(&caller, &amount);
        self.balance_withdrawn_event(nft_id, &caller, BalanceTier::Owned, &amount);
        amount
    }

    /// Returns the caller's own expired, undepleted credit.
    #[endpoint(reclaimExpiredCredits)]
    fn reclaim_expired_credits(&self, nft_id: u64) -> BigUint {
        let caller = self.blockchain().get_caller();
        self.settle(nft_id);

        let now = self.blockchain().get_block_timestamp();
        let deposits = self.credit_deposits(nft_id);
        let first = self.credit_cursor(nft_id).get() + 1;

        let mut reclaimed = BigUint::zero();
        let mut has_unexpired = false;
        for index in first..=deposits.len() {
            let mut deposit = deposits.get(index);
            if deposit.depositor != caller || deposit.remaining == 0u64 {
                continue;
            }
            if now < deposit.expiry {
                has_unexpired = true;
                continue;
            }

            reclaimed += &deposit.remaining;
            deposit.remaining = BigUint::zero();
            self.credit_deposits(nft_id).set(index, &deposit);
        }

        if reclaimed == 0u64 {
            require!(!has_unexpired, ERR_CREDITS_NOT_EXPIRED);
            sc_panic!(ERR_NOTHING_TO_CLAIM);
        }

        self.credit_balance(nft_id).update(|credit| *credit -= &reclaimed);
        self.pay_out(&caller, &reclaimed);
        self.balance_withdrawn_event(nft_id, &caller, BalanceTier::Credit, &reclaimed);
        reclaimed
    }

    // ========================================================
    // Settlement
    // ========================================================

    /// Settles every record of the NFT up to now. Idempotent; anyone may call.
    #[endpoint(updateBalance)]
    fn update_balance(&self, nft_id: u64) {
        self.settle(nft_id);
    }

    fn settle(&self, nft_id: u64) -> BigUint {
        let now = self.blockchain().get_block_timestamp();
        let (_, depleted) = self.run_settlement(nft_id, now, true);
        depleted
    }

    /// Walks the NFT's records, drawing each one's cost for
    /// (last_settle_time, now] from the tiers. When the tiers run dry the
    /// remaining cost is dropped, not carried. With `commit` the fan-out,
    /// the record clocks and the tiers are written; without it, nothing is.
    fn run_settlement(
        &self,
        nft_id: u64,
        now: u64,
        commit: bool,
    ) -> (BalanceTiers<Self::Api>, BigUint) {
        let mut tiers = self.stored_tiers(nft_id);
        let mut depleted = BigUint::zero();
        let mut from_credit = BigUint::zero();

        for subnet_id in self.nft_subnets(nft_id).iter() {
            let mut record = self.subscription(nft_id, subnet_id).get();
            if now <= record.last_settle_time {
                continue;
            }

            let due = &record.drip_rate_per_sec * (now - record.last_settle_time);
            let (drawn, drawn_from_credit) = tiers.draw(&due);
            depleted += &drawn;
            from_credit += &drawn_from_credit;

            if commit {
                self.fan_out(&record, now, &drawn);
                record.last_settle_time = now;
                self.subscription(nft_id, subnet_id).set(&record);
            }
        }

        if commit && depleted > 0u64 {
            self.consume_credit_fifo(nft_id, from_credit);
            self.credit_balance(nft_id).set(&tiers.credit);
            self.external_balance(nft_id).set(&tiers.external);
            self.owned_balance(nft_id).set(&tiers.owned);
            self.balance_settled_event(nft_id, now, &depleted);
        }

        (tiers, depleted)
    }

    fn consume_credit_fifo(&self, nft_id: u64, mut amount: BigUint) {
        let deposits = self.credit_deposits(nft_id);
        let mut cursor = self.credit_cursor(nft_id).get();

        while amount > 0u64 && cursor < deposits.len() {
            let index = cursor + 1;
            let mut deposit = deposits.get(index);
            if deposit.remaining <= amount {
                amount -= &deposit.remaining;
                deposit.remaining = BigUint::zero();
                cursor += 1;
            } else {
                deposit.remaining -= &amount;
                amount = BigUint::zero();
            }
            self.credit_deposits(nft_id).set(index, &deposit);
        }

        self.credit_cursor(nft_id).set(cursor);
    }

    // ========================================================
    // INTERNAL
    // ========================================================

    fn deposit_owned(&self, nft_id: u64, depositor: &ManagedAddress, amount: &BigUint) {
        if *amount == 0u64 {
            return;
        }
        self.owned_balance(nft_id).update(|owned| *owned += amount);
        self.balance_deposited_event(nft_id, depositor, BalanceTier::Owned, amount);
    }

    /// Billing tokens only, no NFT, non-zero.
    fn billing_payment(&self) -> BigUint {
        let attached = self.attached_payments();
        require!(
            attached.nft_nonce.is_none() && attached.amount > 0u64,
            ERR_INVALID_PAYMENT
        );
        attached.amount
    }

    /// The NFT attached and nothing else.
    fn require_holder_call(&self, nft_id: u64) -> ManagedAddress {
        let attached = self.attached_payments();
        self.require_nft_attached(&attached, nft_id);
        require!(attached.amount == 0u64, ERR_INVALID_PAYMENT);
        self.blockchain().get_caller()
    }

    fn stored_tiers(&self, nft_id: u64) -> BalanceTiers<Self::Api> {
        BalanceTiers {
            credit: self.credit_balance(nft_id).get(),
            external: self.external_balance(nft_id).get(),
            owned: self.owned_balance(nft_id).get(),
        }
    }

    // ========================================================
    // VIEWS
    // ========================================================

    #[view(getBalances)]
    fn get_balances(&self, nft_id: u64) -> BalanceTiers<Self::Api> {
        self.stored_tiers(nft_id)
    }

    /// What `updateBalance` would leave in the tiers if called now.
    #[view(getRealtimeBalances)]
    fn get_realtime_balances(&self, nft_id: u64) -> BalanceTiers<Self::Api> {
        let now = self.blockchain().get_block_timestamp();
        let (tiers, _) = self.run_settlement(nft_id, now, false);
        tiers
    }

    /// What `updateBalance` would deplete if called now.
    #[view(getRealtimeCostIncurredUnsettled)]
    fn get_realtime_cost_incurred_unsettled(&self, nft_id: u64) -> BigUint {
        let now = self.blockchain().get_block_timestamp();
        let (_, depleted) = self.run_settlement(nft_id, now, false);
        depleted
    }

    #[view(getTotalBalance)]
    fn get_total_balance(&self, nft_id: u64) -> BigUint {
        self.get_realtime_balances(nft_id).total()
    }

    /// Credit deposits not yet fully spent or reclaimed.
    #[view(getCreditDeposits)]
    fn get_credit_deposits(&self, nft_id: u64) -> MultiValueEncoded<CreditDeposit<Self::Api>> {
        let mut result = MultiValueEncoded::new();
        let deposits = self.credit_deposits(nft_id);
        let first = self.credit_cursor(nft_id).get() + 1;
        for index in first..=deposits.len() {
            let deposit = deposits.get(index);
            if deposit.remaining > 0u64 {
                result.push(deposit);
            }
        }
        result
    }

    #[storage_mapper("creditDeposits")]
    fn credit_deposits(&self, nft_id: u64) -> VecMapper<CreditDeposit<Self::Api>>;

    /// Deposits before this position are fully spent.
    #[storage_mapper("creditCursor")]
    fn credit_cursor(&self, nft_id: u64) -> SingleValueMapper<usize>;

    #[storage_mapper("creditBalance")]
    fn credit_balance(&self, nft_id: u64) -> SingleValueMapper<BigUint>;

    #[storage_mapper("externalBalance")]
    fn external_balance(&self, nft_id: u64) -> SingleValueMapper<BigUint>;

    #[storage_mapper("ownedBalance")]
    fn owned_balance(&self, nft_id: u64) -> SingleValueMapper<BigUint>;
}
