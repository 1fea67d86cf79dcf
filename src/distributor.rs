multiversx_sc::imports!();

use crate::config;
use crate::errors::*;
use crate::events;
use crate::membership;
use crate::pools;
use crate::types::IndexKind;

/// Weight given to clusters listed straight from the whitelist.
pub const DEFAULT_CLUSTER_WEIGHT: u64 = 100;

/// Weighted pro-rata payout of a subnet's compute revenue.
///
/// Weights are frozen for the lifetime of a generation. Within it a
/// cluster's entitlement is `committed * weight / total_weight`, minus what
/// it was already paid in that generation. Changing any weight first closes
/// the generation: every weighted cluster banks its outstanding share and
/// the rounding dust moves into the next generation's committed amount.
#[multiversx_sc::module]
pub trait RevenueDistributorModule:
    config::ConfigModule
    + events::EventsModule
    + membership::MembershipModule
    + pools::RevenuePoolsModule
{
    #[endpoint(collectAndAssignRevenues)]
    fn collect_and_assign_revenues(&self, subnet_id: u64) -> BigUint {
        let amount = self.subnet_pool(subnet_id).take();
        if amount > 0u64 {
            self.committed_revenue(subnet_id)
                .update(|committed| *committed += &amount);
        }

        let generation = self.generation(subnet_id).get();
        self.subnet_revenue_committed_event(subnet_id, generation, &amount);
        amount
    }

    #[endpoint(claimAllRevenue)]
    fn claim_all_revenue(&self) -> BigUint {
        let caller = self.blockchain().get_caller();
        self.claim_all_revenue_for(caller)
    }

    /// Pays every cluster indexed under `wallet`. Funds always go to the
    /// wallet, whoever triggers the claim.
    #[endpoint(claimAllRevenueFor)]
    fn claim_all_revenue_for(&self, wallet: ManagedAddress) -> BigUint {
        let mut total = BigUint::zero();
        for (subnet_id, cluster_id) in self.memberships(IndexKind::ClusterWallet, &wallet).iter() {
            let share = self.current_share(subnet_id, cluster_id);
            let paid = self.cluster_paid(subnet_id, cluster_id).get();
            let mut owed = self.cluster_banked(subnet_id, cluster_id).take();
            if share > paid {
                owed += &(&share - &paid);
                self.cluster_paid(subnet_id, cluster_id).set(&share);
            }

            if owed > 0u64 {
                self.cluster_revenue_claimed_event(&wallet, subnet_id, cluster_id, &owed);
                total += &owed;
            }
        }
        require!(total > 0u64, ERR_NOTHING_TO_CLAIM);

        self.pay_out(&wallet, &total);
        total
    }

    // ========================================================
    // INTERNAL: generation bookkeeping
    // ========================================================

    fn current_share(&self, subnet_id: u64, cluster_id: u64) -> BigUint {
        let weight = self.cluster_weight(subnet_id, cluster_id).get();
        let total_weight = self.total_weight(subnet_id).get();
        if weight == 0 || total_weight == 0 {
            return BigUint::zero();
        }
        self.committed_revenue(subnet_id).get() * weight / total_weight
    }

    fn checkpoint_generation(&self, subnet_id: u64) {
        let committed = self.committed_revenue(subnet_id).get();
        let total_weight = self.total_weight(subnet_id).get();

        let mut distributed = BigUint::zero();
        if total_weight > 0 {
            for cluster_id in self.weighted_clusters(subnet_id).iter() {
                let weight = self.cluster_weight(subnet_id, cluster_id).get();
                let share = &committed * weight / total_weight;
                let paid = self.cluster_paid(subnet_id, cluster_id).take();
                if share > paid {
                    let owed = &share - &paid;
                    self.cluster_banked(subnet_id, cluster_id)
                        .update(|banked| *banked += &owed);
                }
                distributed += &share;
            }
        }

        self.committed_revenue(subnet_id).set(&committed - &distributed);
        self.generation(subnet_id).update(|generation| *generation += 1);
    }

    fn set_cluster_weight(&self, subnet_id: u64, cluster_id: u64, weight: u64) {
        self.checkpoint_generation(subnet_id);

        let previous = self.cluster_weight(subnet_id, cluster_id).get();
        self.cluster_weight(subnet_id, cluster_id).set(weight);
        self.total_weight(subnet_id)
            .update(|total| *total = *total - previous + weight);
        if weight > 0 {
            self.weighted_clusters(subnet_id).insert(cluster_id);
        } else {
            self.weighted_clusters(subnet_id).swap_remove(&cluster_id);
        }

        let generation = self.generation(subnet_id).get();
        self.weight_updated_event(subnet_id, cluster_id, generation, weight);
    }

    fn reset_subnet_weights(&self, subnet_id: u64) {
        self.checkpoint_generation(subnet_id);

        let mut cluster_ids = ManagedVec::<Self::Api, u64>::new();
        for cluster_id in self.weighted_clusters(subnet_id).iter() {
            cluster_ids.push(cluster_id);
        }

        let generation = self.generation(subnet_id).get();
        for cluster_id in cluster_ids.iter() {
            self.cluster_weight(subnet_id, cluster_id).clear();
            self.weight_updated_event(subnet_id, cluster_id, generation, 0);
        }
        self.weighted_clusters(subnet_id).clear();
        self.total_weight(subnet_id).clear();
    }

    // ========================================================
    // VIEWS
    // ========================================================

    #[view(getClusterUnclaimedShare)]
    fn get_cluster_unclaimed_share(&self, subnet_id: u64, cluster_id: u64) -> BigUint {
        let share = self.current_share(subnet_id, cluster_id);
        let paid = self.cluster_paid(subnet_id, cluster_id).get();
        let mut owed = self.cluster_banked(subnet_id, cluster_id).get();
        if share > paid {
            owed += &(&share - &paid);
        }
        owed
    }

    #[view(getClusterWeight)]
    #[storage_mapper("clusterWeight")]
    fn cluster_weight(&self, subnet_id: u64, cluster_id: u64) -> SingleValueMapper<u64>;

    #[view(getTotalWeight)]
    #[storage_mapper("totalWeight")]
    fn total_weight(&self, subnet_id: u64) -> SingleValueMapper<u64>;

    #[view(getCommittedRevenue)]
    #[storage_mapper("committedRevenue")]
    fn committed_revenue(&self, subnet_id: u64) -> SingleValueMapper<BigUint>;

    #[view(getGeneration)]
    #[storage_mapper("generation")]
    fn generation(&self, subnet_id: u64) -> SingleValueMapper<u64>;

    #[storage_mapper("weightedClusters")]
    fn weighted_clusters(&self, subnet_id: u64) -> UnorderedSetMapper<u64>;

    #[storage_mapper("clusterPaid")]
    fn cluster_paid(&self, subnet_id: u64, cluster_id: u64) -> SingleValueMapper<BigUint>;

    #[storage_mapper("clusterBanked")]
    fn cluster_banked(&self, subnet_id: u64, cluster_id: u64) -> SingleValueMapper<BigUint>;
}
