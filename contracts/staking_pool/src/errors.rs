use soroban_sdk::contracterror;

use stqrl::error::ErrorCode as SharedErrors;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum ErrorCode {
    // Input
    #[doc = "Amount must be strictly positive"]
    ZeroAmount = 100,
    #[doc = "Deposit is below the configured minimum"]
    DepositBelowMinimum = 101,
    #[doc = "Bond is not one of the two accepted tiers"]
    InvalidBondTier = 102,
    #[doc = "Pool parameters are inconsistent"]
    InvalidParams = 103,
    OperatorAlreadyRegistered = 104,
    OperatorNotFound = 105,
    MinipoolNotFound = 106,

    // Insufficient balance
    #[doc = "Withdrawal exceeds the account share balance"]
    InsufficientShares = 200,
    #[doc = "Reserve and idle deposits cannot cover the payout"]
    InsufficientLiquidity = 201,
    #[doc = "Payout would leave total backing below on-hand funds"]
    InsufficientBacking = 202,
    #[doc = "Collateral is below the configured minimum"]
    InsufficientCollateral = 203,

    // State conflict
    #[doc = "Account already has an unsettled withdrawal request"]
    WithdrawalRequestPending = 300,
    NoWithdrawalRequest = 301,
    WithdrawalAlreadySettled = 302,
    #[doc = "Withdrawal requests must age one full epoch"]
    ClaimBeforeEpochElapsed = 303,
    #[doc = "Report submitted before the cooldown elapsed"]
    ReportCooldownActive = 304,
    #[doc = "Nested call into the pool during an in-flight mutation"]
    Reentrant = 305,
    InvalidMinipoolTransition = 306,
    OperationPaused = 307,
    OperatorInactive = 308,
    #[doc = "Exit returns more than the pool has counted as staked"]
    ExitExceedsStake = 309,

    // Safety limits
    #[doc = "Reported change exceeds the max rate change of total backing"]
    RateChangeExceedsLimit = 400,
    CommissionOutOfBounds = 401,
    RateLimitOutOfBounds = 402,
    #[doc = "Reported loss exceeds the staked portion of the pool"]
    SlashingExceedsStake = 403,

    // Lifecycle
    AlreadyInitialized = 500,
    NotInitialized = 501,
    NotAuthorized = 502,

    // Arithmetic
    MathError = 900,
}

impl From<SharedErrors> for ErrorCode {
    fn from(err: SharedErrors) -> Self {
        match err {
            SharedErrors::MathError => ErrorCode::MathError,
        }
    }
}

pub type PoolResult<T = ()> = Result<T, ErrorCode>;
