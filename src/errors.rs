// Stable rejection reasons. Callers match on these strings, never reword them.

// ── PreconditionFailed ──
pub const ERR_NOT_OWNER: &str = "NotOwner";
pub const ERR_INSUFFICIENT_COLLATERAL: &str = "InsufficientCollateral";
pub const ERR_INSUFFICIENT_FUNDS: &str = "InsufficientFunds";
pub const ERR_UNAUTHORIZED: &str = "Unauthorized";
pub const ERR_NOTHING_TO_CLAIM: &str = "NothingToClaim";
pub const ERR_INVALID_PAYMENT: &str = "InvalidPayment";

// ── CapacityExceeded ──
pub const ERR_NO_SPOTS_AVAILABLE: &str = "NoSpotsAvailable";
pub const ERR_SUBSCRIPTION_LIMIT: &str = "SubnetSubscriptionLimitExceeded";

// ── TimingNotElapsed ──
pub const ERR_COOLDOWN_NOT_OVER: &str = "CooldownNotOver";
pub const ERR_CREDITS_NOT_EXPIRED: &str = "CreditsNotExpired";
pub const ERR_CHANGE_NOTICE_NOT_ELAPSED: &str = "ChangeNoticeNotElapsed";

// ── InvalidInput ──
pub const ERR_DNS_REQUIRED: &str = "DNSRequired";
pub const ERR_LENGTH_MISMATCH: &str = "LengthMismatch";
pub const ERR_UNKNOWN_SUBNET: &str = "UnknownSubnet";
pub const ERR_UNKNOWN_CLUSTER: &str = "UnknownCluster";
pub const ERR_INVALID_PERCENTAGE: &str = "InvalidPercentage";
pub const ERR_INVALID_EXPIRY: &str = "InvalidExpiry";
pub const ERR_INVALID_CAPACITY: &str = "InvalidCapacity";
pub const ERR_WHITELIST_INDEX_MISMATCH: &str = "WhitelistIndexMismatch";
pub const ERR_ZERO_ADDRESS: &str = "ZeroAddress";
pub const ERR_INVALID_TOKEN: &str = "InvalidToken";

// ── StateConflict ──
pub const ERR_CLUSTER_ALREADY_DELISTED: &str = "ClusterAlreadyDelisted";
pub const ERR_CLUSTER_ALREADY_LISTED: &str = "ClusterAlreadyListed";
pub const ERR_CLUSTER_NOT_LISTED: &str = "ClusterNotListed";
pub const ERR_CLUSTER_NOT_DELISTED: &str = "ClusterNotDelisted";
pub const ERR_SUBNET_NOT_LISTED: &str = "SubnetNotListed";
pub const ERR_SUBNET_NOT_DELISTED: &str = "SubnetNotDelisted";
pub const ERR_ALREADY_SUBSCRIBED: &str = "AlreadySubscribed";
pub const ERR_NOT_SUBSCRIBED: &str = "NotSubscribed";
pub const ERR_NO_PENDING_PRICE_CHANGE: &str = "NoPendingPriceChange";
pub const ERR_NO_PENDING_PROVIDER_CHANGE: &str = "NoPendingServiceProviderChange";
pub const ERR_SUPPORT_ALREADY_REGISTERED: &str = "SupportAlreadyRegistered";
pub const ERR_CAPACITY_BELOW_USAGE: &str = "CapacityBelowUsage";
pub const ERR_COLLATERAL_NOT_LOCKED: &str = "CollateralNotLocked";
