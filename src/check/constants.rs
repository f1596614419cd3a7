//! Defaults for the redirect check (timeouts, retry budget, chunking).

use std::time::Duration;

/// Default maximum number of redirect hops followed per source URL.
pub const DEFAULT_MAX_REDIRECTIONS: u32 = 3;

/// Default number of retries after the initial attempt for transient failures.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay for exponential backoff (1 second).
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(1000);

/// Default per-request timeout covering connect, headers and body drain (10 seconds).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Default number of pairs resolved concurrently in one chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 8;

/// Default pause between chunks (2 seconds).
pub const DEFAULT_CHUNK_DELAY: Duration = Duration::from_millis(2000);

/// Status codes accepted as a permanent redirect by default.
pub const DEFAULT_PERMANENT_REDIRECT_CODES: [u16; 2] = [301, 308];
