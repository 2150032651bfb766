// Worker constants (no magic values)
use std::time::Duration;

/// Periodic processing pass interval (30s)
pub const DEFAULT_PROCESS_INTERVAL: Duration = Duration::from_secs(30);

/// Age-based cleanup sweep interval (1h)
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(3600);

/// Requests older than this are swept by the cleanup scheduler (24h)
pub const DEFAULT_MAX_REQUEST_AGE: Duration = Duration::from_secs(24 * 3600);

/// Id generation attempts before falling back to a suffixed id
pub const MAX_ID_ATTEMPTS: usize = 8;
