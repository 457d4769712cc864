//! Centralized Error Handling Module
//!
//! Every rejected ledger call carries a unique code plus the exact reason
//! string clients match on (e.g. "time between transfers should be 10 seconds").
//!
//! Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - Ledger integrity: balance, allowance, zero address/amount
//! - Guards: cooldown, vesting gates, authorization
//! - External: router
//! - CFG_xxx: Configuration errors

use std::fmt;

/// Ledger-wide error type
#[derive(Debug)]
pub struct LedgerError {
    /// Unique error code for logging/monitoring
    pub code: ErrorCode,
    /// Human-readable reason, matched verbatim by callers
    pub message: String,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl LedgerError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for LedgerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Unique error codes for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // ============================================
    // Ledger integrity
    // ============================================
    /// Sender balance below the transfer amount
    InsufficientBalance,
    /// Spender allowance below the transfer amount
    InsufficientAllowance,
    /// Zero address on either side
    ZeroAddress,
    /// Sender is a protocol-held account (vesting vault, contract outside a swap)
    ProtectedAccount,
    /// Transfer of nothing
    ZeroAmount,
    /// U256 overflow while crediting
    ArithmeticOverflow,

    // ============================================
    // Guards
    // ============================================
    /// Sender transferred again inside the minimum interval
    CooldownViolation,
    /// Vesting cliff not reached
    TooSoon,
    /// Nothing new is releasable, or the pool is fully released
    NothingToUnlock,
    /// Caller may not unlock this pool
    Unauthorized,
    /// No pool with that identifier
    UnknownPool,

    // ============================================
    // External
    // ============================================
    /// Router swap or add-liquidity did not complete
    RouterFailure,

    // ============================================
    // Configuration Errors
    // ============================================
    ConfigInvalidValue,
    FeeRatesTooHigh,
    ScheduleInvalid,
    ScheduleExceedsSupply,
    ConfigIo,
    ConfigParse,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InsufficientBalance => "INSUFFICIENT_BALANCE",
            Self::InsufficientAllowance => "INSUFFICIENT_ALLOWANCE",
            Self::ZeroAddress => "ZERO_ADDRESS",
            Self::ProtectedAccount => "PROTECTED_ACCOUNT",
            Self::ZeroAmount => "ZERO_AMOUNT",
            Self::ArithmeticOverflow => "ARITHMETIC_OVERFLOW",

            Self::CooldownViolation => "COOLDOWN_VIOLATION",
            Self::TooSoon => "TOO_SOON",
            Self::NothingToUnlock => "NOTHING_TO_UNLOCK",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::UnknownPool => "UNKNOWN_POOL",

            Self::RouterFailure => "ROUTER_FAILURE",

            Self::ConfigInvalidValue => "CFG_INVALID_VALUE",
            Self::FeeRatesTooHigh => "CFG_FEE_RATES_TOO_HIGH",
            Self::ScheduleInvalid => "CFG_SCHEDULE_INVALID",
            Self::ScheduleExceedsSupply => "CFG_SCHEDULE_EXCEEDS_SUPPLY",
            Self::ConfigIo => "CFG_IO",
            Self::ConfigParse => "CFG_PARSE",
        }
    }

    /// HTTP status for API responses
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ZeroAddress | Self::ZeroAmount | Self::ConfigInvalidValue => 400,
            Self::Unauthorized | Self::ProtectedAccount => 403,
            Self::UnknownPool => 404,
            Self::InsufficientBalance
            | Self::InsufficientAllowance
            | Self::CooldownViolation
            | Self::TooSoon
            | Self::NothingToUnlock => 422,
            Self::RouterFailure => 502,
            _ => 500,
        }
    }

    /// Only router hiccups are worth retrying; every ledger rejection is final
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RouterFailure)
    }
}

// ============================================
// Convenience constructors
// ============================================

impl LedgerError {
    pub fn insufficient_balance() -> Self {
        Self::new(
            ErrorCode::InsufficientBalance,
            "ERC20: transfer amount exceeds balance",
        )
    }

    pub fn insufficient_allowance() -> Self {
        Self::new(ErrorCode::InsufficientAllowance, "ERC20: insufficient allowance")
    }

    pub fn zero_sender() -> Self {
        Self::new(ErrorCode::ZeroAddress, "ERC20: transfer from the zero address")
    }

    pub fn zero_recipient() -> Self {
        Self::new(ErrorCode::ZeroAddress, "ERC20: transfer to the zero address")
    }

    pub fn zero_approval() -> Self {
        Self::new(ErrorCode::ZeroAddress, "ERC20: approve to the zero address")
    }

    pub fn protected_account(account: &str) -> Self {
        Self::new(
            ErrorCode::ProtectedAccount,
            format!("{} balance can only move through the token itself", account),
        )
    }

    pub fn zero_amount() -> Self {
        Self::new(
            ErrorCode::ZeroAmount,
            "Transfer amount must be greater than zero",
        )
    }

    pub fn overflow(context: &str) -> Self {
        Self::new(
            ErrorCode::ArithmeticOverflow,
            format!("Arithmetic overflow: {}", context),
        )
    }

    pub fn cooldown(min_interval_secs: u64) -> Self {
        Self::new(
            ErrorCode::CooldownViolation,
            format!(
                "time between transfers should be {} seconds",
                min_interval_secs
            ),
        )
    }

    pub fn too_soon() -> Self {
        Self::new(ErrorCode::TooSoon, "it is too soon to unlock")
    }

    pub fn nothing_to_unlock() -> Self {
        Self::new(ErrorCode::NothingToUnlock, "Now there is no token to unlock")
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, msg)
    }

    pub fn unknown_pool(pool: &str) -> Self {
        Self::new(ErrorCode::UnknownPool, format!("Unknown vesting pool: {}", pool))
    }

    pub fn router(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::RouterFailure, msg)
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigInvalidValue, msg)
    }

    pub fn invalid_schedule(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ScheduleInvalid, msg)
    }
}

/// Ledger Result type
pub type LedgerResult<T> = Result<T, LedgerError>;

// ============================================
// Conversion from common error types
// ============================================

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorCode::ConfigIo, "IO error", err)
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorCode::ConfigParse, "JSON parse error", err)
    }
}
