/*!
 * System Limits and Constants
 *
 * Centralized location for the simulation bounds and default timings.
 */

use std::time::Duration;

// =============================================================================
// SIMULATION LIMITS
// =============================================================================

/// Maximum producer actors accepted by the command line
pub const MAX_PRODUCERS: usize = 20;

/// Maximum consumer actors accepted by the command line
pub const MAX_CONSUMERS: usize = 20;

/// Maximum ring capacity accepted by the command line
/// Library callers may build larger buffers
pub const MAX_SLOTS: usize = 20;

/// Number of distinct type tags the simulation alternates between
pub const SIMULATION_TYPE_COUNT: u32 = 2;

// =============================================================================
// TIMING
// =============================================================================

/// Upper bound of the random production/consumption latency
pub const DEFAULT_MAX_LATENCY: Duration = Duration::from_millis(1000);

// =============================================================================
// COURT
// =============================================================================

/// Players per game
pub const PLAYERS_PER_GAME: usize = 2;

/// Players spawned by the court binary
pub const DEFAULT_COURT_PLAYERS: usize = 10;
