multiversx_sc::imports!();
multiversx_sc::derive_imports!();

// ============================================================
// Cluster status and capacity lifecycle
// ============================================================

#[type_abi]
#[derive(TopEncode, TopDecode, NestedEncode, NestedDecode, Clone, Copy, PartialEq, Debug)]
pub enum ClusterStatus {
    /// Signed up, waiting for DAO approval. Occupies a slot.
    Waiting,
    /// Serving subscriptions and eligible for revenue weight. Occupies a slot.
    Listed,
    /// Removed by the DAO. Frees its slot immediately.
    Delisted,
}

impl ClusterStatus {
    pub fn occupies_slot(&self) -> bool {
        matches!(self, ClusterStatus::Waiting | ClusterStatus::Listed)
    }
}

// ============================================================
// Roles and indexed-set namespaces
// ============================================================

#[type_abi]
#[derive(TopEncode, TopDecode, NestedEncode, NestedDecode, Clone, Copy, PartialEq, Debug)]
pub enum Role {
    WhitelistManager,
    ClusterListManager,
    PriceManager,
    WeightManager,
    StakeManager,
    CustodyManager,
    SupportManager,
}

impl Role {
    pub fn id(&self) -> u64 {
        *self as u64
    }
}

/// Namespaces of the address reverse index. Each entry is an
/// (owner key, entry key) pair, e.g. (subnet, whitelist index).
#[type_abi]
#[derive(TopEncode, TopDecode, NestedEncode, NestedDecode, Clone, Copy, PartialEq, Debug)]
pub enum IndexKind {
    Role,
    Whitelist,
    ClusterWallet,
}

#[type_abi]
#[derive(TopEncode, TopDecode, NestedEncode, NestedDecode, Clone, Copy, PartialEq, Debug)]
pub enum BalanceTier {
    Credit,
    External,
    Owned,
}

// ============================================================
// Subnet: priced compute catalog entry
// ============================================================

/// Caller-supplied attributes for `createSubnet`.
#[type_abi]
#[derive(TopEncode, TopDecode, NestedEncode, NestedDecode, Clone, Debug)]
pub struct SubnetParams<M: ManagedTypeApi> {
    pub owner_dao: ManagedAddress<M>,
    pub unit_prices: ManagedVec<M, BigUint<M>>,
    pub other_attributes: ManagedVec<M, u64>,
    pub max_clusters: u64,
    pub sovereign: bool,
    pub cloud_provider_type: u8,
    pub support_fee_rate: u64,
    /// Stake each cluster pays on sign-up.
    pub collateral_required: BigUint<M>,
}

#[type_abi]
#[derive(TopEncode, TopDecode, NestedEncode, NestedDecode, Clone, PartialEq, Debug)]
pub struct Subnet<M: ManagedTypeApi> {
    pub id: u64,
    pub owner_dao: ManagedAddress<M>,
    pub unit_prices: ManagedVec<M, BigUint<M>>,
    pub other_attributes: ManagedVec<M, u64>,
    pub max_clusters: u64,
    pub listed: bool,
    pub sovereign: bool,
    pub cloud_provider_type: u8,
    pub support_fee_rate: u64,
    pub collateral_required: BigUint<M>,
    pub collateral_nonce: u64,
    pub created_at: u64,
}

#[type_abi]
#[derive(TopEncode, TopDecode, NestedEncode, NestedDecode, Clone, PartialEq, Debug)]
pub struct PriceChangeRequest<M: ManagedTypeApi> {
    pub new_prices: ManagedVec<M, BigUint<M>>,
    pub requested_at: u64,
}

// ============================================================
// Cluster: capacity slot holder
// ============================================================

#[type_abi]
#[derive(TopEncode, TopDecode, NestedEncode, NestedDecode, Clone, PartialEq, Debug)]
pub struct Cluster<M: ManagedTypeApi> {
    pub id: u64,
    pub subnet_id: u64,
    pub owner: ManagedAddress<M>,
    pub wallet: ManagedAddress<M>,
    pub operator: ManagedAddress<M>,
    pub dns_ip: ManagedBuffer<M>,
    pub name: ManagedBuffer<M>,
    pub collateral_nonce: u64,
    /// Remaining sign-up fee held as stake.
    pub stake: BigUint<M>,
    pub status: ClusterStatus,
}

// ============================================================
// Configuration
// ============================================================

/// Fee percentages, all out of 100000.
#[type_abi]
#[derive(TopEncode, TopDecode, NestedEncode, NestedDecode, Clone, Copy, PartialEq, Debug)]
pub struct FeeSettings {
    pub dao_rate: u64,
    pub referral_percent: u64,
    pub referral_expiry_secs: u64,
    pub support_fee_percent: u64,
}

/// Durations in seconds.
#[type_abi]
#[derive(TopEncode, TopDecode, NestedEncode, NestedDecode, Clone, Copy, PartialEq, Debug)]
pub struct TimingSettings {
    pub price_change_cooldown: u64,
    pub service_provider_notice: u64,
    pub service_provider_cooldown: u64,
    pub min_time_funds: u64,
}

#[type_abi]
#[derive(TopEncode, TopDecode, NestedEncode, NestedDecode, Clone, PartialEq, Debug)]
pub struct SupportOverride<M: ManagedTypeApi> {
    pub address: ManagedAddress<M>,
    pub fee_percent: u64,
}

// ============================================================
// Subscription record, one per (nft, subnet)
// ============================================================

/// Fee percentages frozen into a record when it is priced.
#[type_abi]
#[derive(TopEncode, TopDecode, NestedEncode, NestedDecode, Clone, Copy, PartialEq, Debug)]
pub struct FeeRates {
    pub dao_rate: u64,
    pub support_percent: u64,
    pub referral_percent: u64,
}

impl FeeRates {
    pub fn sum(&self) -> u64 {
        self.dao_rate + self.support_percent + self.referral_percent
    }
}

#[type_abi]
#[derive(TopEncode, TopDecode, NestedEncode, NestedDecode, Clone, PartialEq, Debug)]
pub struct SubscriptionRecord<M: ManagedTypeApi> {
    pub nft_id: u64,
    pub subnet_id: u64,
    pub service_provider: ManagedAddress<M>,
    pub referral_address: ManagedAddress<M>,
    pub license_address: ManagedAddress<M>,
    pub support_address: ManagedAddress<M>,
    pub license_fee: BigUint<M>,
    pub compute_vector: ManagedVec<M, u64>,
    pub compute_cost_per_sec: BigUint<M>,
    pub fee_rates: FeeRates,
    pub drip_rate_per_sec: BigUint<M>,
    pub subscribed_at: u64,
    /// Last second (inclusive) that still pays the referral slice.
    pub referral_expiry: u64,
    pub last_settle_time: u64,
}

#[type_abi]
#[derive(TopEncode, TopDecode, NestedEncode, NestedDecode, Clone, PartialEq, Debug)]
pub struct ServiceProviderChange<M: ManagedTypeApi> {
    pub new_provider: ManagedAddress<M>,
    pub requested_at: u64,
}

// ============================================================
// Balances
// ============================================================

#[type_abi]
#[derive(TopEncode, TopDecode, NestedEncode, NestedDecode, Clone, PartialEq, Debug)]
pub struct CreditDeposit<M: ManagedTypeApi> {
    pub depositor: ManagedAddress<M>,
    /// Not yet depleted nor reclaimed.
    pub remaining: BigUint<M>,
    pub expiry: u64,
    pub deposited_at: u64,
}

#[type_abi]
#[derive(TopEncode, TopDecode, NestedEncode, NestedDecode, Clone, PartialEq, Debug)]
pub struct BalanceTiers<M: ManagedTypeApi> {
    pub credit: BigUint<M>,
    pub external: BigUint<M>,
    pub owned: BigUint<M>,
}

impl<M: ManagedTypeApi> BalanceTiers<M> {
    pub fn total(&self) -> BigUint<M> {
        let mut total = self.credit.clone();
        total += &self.external;
        total += &self.owned;
        total
    }

    /// Depletes up to `due` in credit → external → owned order, clamping
    /// each tier at zero and carrying the rest to the next one.
    /// Returns (drawn in total, drawn from credit).
    pub fn draw(&mut self, due: &BigUint<M>) -> (BigUint<M>, BigUint<M>) {
        let mut outstanding = due.clone();
        let from_credit = take_from(&mut self.credit, &mut outstanding);
        take_from(&mut self.external, &mut outstanding);
        take_from(&mut self.owned, &mut outstanding);

        (due - &outstanding, from_credit)
    }
}

fn take_from<M: ManagedTypeApi>(tier: &mut BigUint<M>, outstanding: &mut BigUint<M>) -> BigUint<M> {
    let taken = if *tier >= *outstanding {
        outstanding.clone()
    } else {
        tier.clone()
    };
    *tier -= &taken;
    *outstanding -= &taken;
    taken
}

// ============================================================
// Revenue split of one settled interval
// ============================================================

#[type_abi]
#[derive(TopEncode, TopDecode, NestedEncode, NestedDecode, Clone, PartialEq, Debug)]
pub struct RevenueSplit<M: ManagedTypeApi> {
    pub compute: BigUint<M>,
    pub license: BigUint<M>,
    pub support: BigUint<M>,
    pub referral: BigUint<M>,
    pub treasury: BigUint<M>,
}

impl<M: ManagedTypeApi> RevenueSplit<M> {
    pub fn total(&self) -> BigUint<M> {
        let mut total = self.compute.clone();
        total += &self.license;
        total += &self.support;
        total += &self.referral;
        total += &self.treasury;
        total
    }
}
