// =============================================================================
// CampusNet Backend Constants
// =============================================================================
// This file contains all constants used throughout the backend to enable
// easy tuning and configuration from a single location.

// =============================================================================
// SERVER CONFIGURATION
// =============================================================================

/// Default port the server binds to when PORT is not set
pub const DEFAULT_SERVER_PORT: u16 = 3001;

/// Default connection pool size when DB_MAX_CONNECTIONS is not set
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

// =============================================================================
// RELATIONSHIPS
// =============================================================================

/// Maximum number of profiles returned in a suggestion list
pub const SUGGESTION_LIMIT: i64 = 20;

// =============================================================================
// NOTIFIER
// =============================================================================

/// Request timeout for webhook notification delivery
pub const NOTIFIER_TIMEOUT_SECONDS: u64 = 5;
