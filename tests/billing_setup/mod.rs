#![allow(dead_code)]
#![allow(deprecated)]

use compute_billing::{
    ledger::BalanceLedgerModule,
    registry::ResourceRegistryModule,
    subscription::SubscriptionModule,
    types::{FeeSettings, SubnetParams, TimingSettings},
    ComputeBilling,
};
use multiversx_sc::{
    codec::Empty,
    types::{Address, ManagedAddress, ManagedVec},
};
use multiversx_sc_scenario::{
    managed_address, managed_biguint, managed_buffer, managed_token_id, num_bigint,
    rust_biguint, whitebox_legacy::*, DebugApi,
};

pub const WASM_PATH: &str = "output/compute-billing.wasm";
pub const BILLING_TOKEN: &[u8] = b"BILL-123456";
pub const NFT_TOKEN: &[u8] = b"NODE-abcdef";

pub const SUBNET_CREATION_FEE: u64 = 1_000;
pub const CLUSTER_COLLATERAL: u64 = 500;
pub const MAX_SUBNETS_PER_NFT: u64 = 2;

pub const DAO_RATE: u64 = 10_000;
pub const REFERRAL_PERCENT: u64 = 20_000;
pub const REFERRAL_EXPIRY_SECS: u64 = 100;
pub const SUPPORT_FEE_PERCENT: u64 = 5_000;

pub const PRICE_CHANGE_COOLDOWN: u64 = 1_000;
pub const PROVIDER_NOTICE: u64 = 500;
pub const PROVIDER_COOLDOWN: u64 = 2_000;
pub const MIN_TIME_FUNDS: u64 = 10;

/// Unit prices [10, 20, 0, 0] with resources [1, 2, 0, 0] cost 50 per
/// second. With 35% of fees on top and a license fee of 3 the record
/// drips 3 + 67 = 70 per second, split per second as compute 50,
/// license 3, support 2, referral 10 and treasury 5.
pub const UNIT_PRICES: [u64; 4] = [10, 20, 0, 0];
pub const COMPUTE_VECTOR: [u64; 4] = [1, 2, 0, 0];
pub const LICENSE_FEE: u64 = 3;
pub const COMPUTE_PER_SEC: u64 = 50;
pub const LICENSE_PER_SEC: u64 = 3;
pub const SUPPORT_PER_SEC: u64 = 2;
pub const REFERRAL_PER_SEC: u64 = 10;
pub const DRIP_RATE: u64 = 70;

pub const START: u64 = 1_000;

pub struct BillingSetup<Builder>
where
    Builder: 'static + Copy + Fn() -> compute_billing::ContractObj<DebugApi>,
{
    pub b_mock: BlockchainStateWrapper,
    pub owner: Address,
    pub dao: Address,
    pub support: Address,
    pub subnet_dao: Address,
    pub subscriber: Address,
    pub provider: Address,
    pub license: Address,
    pub referral: Address,
    pub subscriber_nft: u64,
    pub next_nonce: u64,
    pub subnet_count: u64,
    pub contract: ContractObjWrapper<compute_billing::ContractObj<DebugApi>, Builder>,
}

impl<Builder> BillingSetup<Builder>
where
    Builder: 'static + Copy + Fn() -> compute_billing::ContractObj<DebugApi>,
{
    pub fn new(builder: Builder) -> Self {
        let mut b_mock = BlockchainStateWrapper::new();
        let owner = b_mock.create_user_account(&rust_biguint!(0));
        let dao = b_mock.create_user_account(&rust_biguint!(0));
        let support = b_mock.create_user_account(&rust_biguint!(0));
        let subnet_dao = b_mock.create_user_account(&rust_biguint!(0));
        let subscriber = b_mock.create_user_account(&rust_biguint!(0));
        let provider = b_mock.create_user_account(&rust_biguint!(0));
        let license = b_mock.create_user_account(&rust_biguint!(0));
        let referral = b_mock.create_user_account(&rust_biguint!(0));

        b_mock.set_esdt_balance(&subnet_dao, BILLING_TOKEN, &rust_biguint!(100_000));
        b_mock.set_esdt_balance(&subscriber, BILLING_TOKEN, &rust_biguint!(1_000_000));

        let contract =
            b_mock.create_sc_account(&rust_biguint!(0), Some(&owner), builder, WASM_PATH);

        b_mock.set_block_timestamp(START);
        b_mock
            .execute_tx(&owner, &contract, &rust_biguint!(0), |sc| {
                sc.init(
                    managed_token_id!(BILLING_TOKEN),
                    managed_token_id!(NFT_TOKEN),
                    managed_address!(&dao),
                    managed_address!(&support),
                    managed_biguint!(SUBNET_CREATION_FEE),
                    MAX_SUBNETS_PER_NFT,
                    FeeSettings {
                        dao_rate: DAO_RATE,
                        referral_percent: REFERRAL_PERCENT,
                        referral_expiry_secs: REFERRAL_EXPIRY_SECS,
                        support_fee_percent: SUPPORT_FEE_PERCENT,
                    },
                    TimingSettings {
                        price_change_cooldown: PRICE_CHANGE_COOLDOWN,
                        service_provider_notice: PROVIDER_NOTICE,
                        service_provider_cooldown: PROVIDER_COOLDOWN,
                        min_time_funds: MIN_TIME_FUNDS,
                    },
                );
            })
            .assert_ok();

        let mut setup = BillingSetup {
            b_mock,
            owner,
            dao,
            support,
            subnet_dao,
            subscriber,
            provider,
            license,
            referral,
            subscriber_nft: 0,
            next_nonce: 1,
            subnet_count: 0,
            contract,
        };
        let subscriber = setup.subscriber.clone();
        setup.subscriber_nft = setup.mint_nft(&subscriber);
        setup
    }

    // ── Accounts ──

    pub fn new_user(&mut self, billing_balance: u64) -> Address {
        let user = self.b_mock.create_user_account(&rust_biguint!(0));
        if billing_balance > 0 {
            self.b_mock
                .set_esdt_balance(&user, BILLING_TOKEN, &rust_biguint!(billing_balance));
        }
        user
    }

    pub fn mint_nft(&mut self, to: &Address) -> u64 {
        let nonce = self.next_nonce;
        self.next_nonce += 1;
        self.b_mock
            .set_nft_balance(to, NFT_TOKEN, nonce, &rust_biguint!(1), &Empty);
        nonce
    }

    pub fn set_time(&mut self, timestamp: u64) {
        self.b_mock.set_block_timestamp(timestamp);
    }

    pub fn billing_balance(&self, address: &Address) -> num_bigint::BigUint {
        self.b_mock.get_esdt_balance(address, BILLING_TOKEN, 0)
    }

    pub fn nft_balance(&self, address: &Address, nonce: u64) -> num_bigint::BigUint {
        self.b_mock.get_esdt_balance(address, NFT_TOKEN, nonce)
    }

    // ── Registry ──

    pub fn create_subnet(&mut self, max_clusters: u64, sovereign: bool) -> u64 {
        let subnet_dao = self.subnet_dao.clone();
        let collateral = self.mint_nft(&subnet_dao);
        self.b_mock
            .execute_esdt_multi_transfer(
                &subnet_dao,
                &self.contract,
                &[
                    nft_transfer(collateral),
                    billing_transfer(SUBNET_CREATION_FEE),
                ],
                |sc| {
                    sc.create_subnet(subnet_params(&subnet_dao, max_clusters, sovereign));
                },
            )
            .assert_ok();

        self.subnet_count += 1;
        self.subnet_count
    }

    pub fn sign_up_cluster(
        &mut self,
        subnet_id: u64,
        owner: &Address,
        wallet: &Address,
        dns_ip: &[u8],
    ) -> TxResult {
        let collateral = self.mint_nft(owner);
        let wallet = wallet.clone();
        let dns_ip = dns_ip.to_vec();
        self.b_mock.execute_esdt_multi_transfer(
            owner,
            &self.contract,
            &[nft_transfer(collateral), billing_transfer(CLUSTER_COLLATERAL)],
            |sc| {
                sc.cluster_sign_up(
                    subnet_id,
                    managed_buffer!(&dns_ip),
                    managed_address!(&wallet),
                    managed_address!(&wallet),
                    managed_buffer!(b"node"),
                );
            },
        )
    }

    /// Signs up a fresh owner with its own wallet.
    pub fn new_cluster(&mut self, subnet_id: u64) -> (Address, Address) {
        let owner = self.new_user(CLUSTER_COLLATERAL);
        let wallet = self.new_user(0);
        self.sign_up_cluster(subnet_id, &owner, &wallet, b"10.0.0.1")
            .assert_ok();
        (owner, wallet)
    }

    pub fn approve_cluster(&mut self, subnet_id: u64, cluster_id: u64, weight: u64) -> TxResult {
        let subnet_dao = self.subnet_dao.clone();
        self.b_mock
            .execute_tx(&subnet_dao, &self.contract, &rust_biguint!(0), |sc| {
                sc.approve_listing_cluster(subnet_id, cluster_id, weight);
            })
    }

    pub fn delist_subnet(&mut self, subnet_id: u64) {
        let owner = self.owner.clone();
        self.b_mock
            .execute_tx(&owner, &self.contract, &rust_biguint!(0), |sc| {
                sc.change_subnet_listing(subnet_id, false);
            })
            .assert_ok();
    }

    // ── Subscriptions ──

    /// Subscribes the setup NFT with the standard resources, attaching
    /// `deposit` billing tokens for the owned tier.
    pub fn subscribe(&mut self, subnet_id: u64, deposit: u64, with_referral: bool) -> TxResult {
        let subscriber = self.subscriber.clone();
        let provider = self.provider.clone();
        let license = self.license.clone();
        let referral = if with_referral {
            Some(self.referral.clone())
        } else {
            None
        };
        let nft_id = self.subscriber_nft;

        let mut transfers = vec![nft_transfer(nft_id)];
        if deposit > 0 {
            transfers.push(billing_transfer(deposit));
        }
        self.b_mock
            .execute_esdt_multi_transfer(&subscriber, &self.contract, &transfers, |sc| {
                let referral_address = match &referral {
                    Some(address) => managed_address!(address),
                    None => ManagedAddress::zero(),
                };
                sc.create_subscription(
                    nft_id,
                    subnet_id,
                    managed_address!(&provider),
                    referral_address,
                    managed_address!(&license),
                    managed_biguint!(LICENSE_FEE),
                    compute_vector(),
                );
            })
    }

    pub fn update_balance(&mut self) {
        let nft_id = self.subscriber_nft;
        let caller = self.owner.clone();
        self.b_mock
            .execute_tx(&caller, &self.contract, &rust_biguint!(0), |sc| {
                sc.update_balance(nft_id);
            })
            .assert_ok();
    }
}

// ── Payment and argument builders ──

pub fn nft_transfer(nonce: u64) -> TxTokenTransfer {
    TxTokenTransfer {
        token_identifier: NFT_TOKEN.to_vec(),
        nonce,
        value: rust_biguint!(1),
    }
}

pub fn billing_transfer(amount: u64) -> TxTokenTransfer {
    TxTokenTransfer {
        token_identifier: BILLING_TOKEN.to_vec(),
        nonce: 0,
        value: rust_biguint!(amount),
    }
}

pub fn unit_prices(prices: [u64; 4]) -> ManagedVec<DebugApi, multiversx_sc::types::BigUint<DebugApi>> {
    let mut result = ManagedVec::new();
    for price in prices {
        result.push(managed_biguint!(price));
    }
    result
}

pub fn compute_vector() -> ManagedVec<DebugApi, u64> {
    let mut result = ManagedVec::new();
    for units in COMPUTE_VECTOR {
        result.push(units);
    }
    result
}

pub fn subnet_params(
    owner_dao: &Address,
    max_clusters: u64,
    sovereign: bool,
) -> SubnetParams<DebugApi> {
    SubnetParams {
        owner_dao: managed_address!(owner_dao),
        unit_prices: unit_prices(UNIT_PRICES),
        other_attributes: ManagedVec::new(),
        max_clusters,
        sovereign,
        cloud_provider_type: 0,
        support_fee_rate: 0,
        collateral_required: managed_biguint!(CLUSTER_COLLATERAL),
    }
}
