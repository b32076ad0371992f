/*!
 * Court Monitor
 *
 * Gates pairwise access to a shared court. Players enter two at a time,
 * the second arrival starts the game, and the court only reopens once both
 * players of the game have left.
 */

use crate::core::limits::PLAYERS_PER_GAME;
use crate::core::types::{ActorId, MonitorResult};
use crate::core::MonitorError;
use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Court state, also returned as a snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourtState {
    /// Players currently inside
    pub on_court: usize,
    /// Players of the current game that have started playing
    pub playing: usize,
    /// Players of the current game that have already left
    pub exiting: usize,
    pub games_completed: u64,
}

/// Pairwise court monitor
#[derive(Debug, Default)]
pub struct Court {
    state: Mutex<CourtState>,
    /// Players waiting outside for the court to open
    outside: Condvar,
    /// Player inside waiting for a partner
    court: Condvar,
}

impl Court {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the court, waiting while a game is on or two players are inside
    pub fn ask_court(&self, player: ActorId) -> MonitorResult<()> {
        let mut state = self.state.lock();
        while state.playing != 0 || state.on_court >= PLAYERS_PER_GAME {
            self.outside.wait(&mut state);
        }

        state.on_court += 1;
        debug!(player, on_court = state.on_court, "entered court");
        if state.on_court == 1 {
            // room for a partner
            self.outside.notify_all();
        }
        Ok(())
    }

    /// Start the game, waiting while alone on a court where play has not begun
    pub fn start_play(&self, player: ActorId) -> MonitorResult<()> {
        let mut state = self.state.lock();
        if state.on_court == 0 {
            return Err(MonitorError::InvariantViolation(format!(
                "player {} starts play on an empty court",
                player
            )));
        }

        while state.on_court == 1 && state.playing == 0 {
            self.court.wait(&mut state);
        }

        state.playing += 1;
        debug!(player, playing = state.playing, "playing");
        if state.playing == 1 {
            self.court.notify_all();
        }
        Ok(())
    }

    /// Leave the court; the last player of a game reopens it
    pub fn free_court(&self, player: ActorId) -> MonitorResult<()> {
        let mut state = self.state.lock();
        if state.on_court == 0 {
            return Err(MonitorError::InvariantViolation(format!(
                "player {} leaves an empty court",
                player
            )));
        }

        state.on_court -= 1;
        state.exiting += 1;
        debug!(player, on_court = state.on_court, "left court");

        if state.exiting == PLAYERS_PER_GAME {
            state.exiting = 0;
            state.playing = 0;
            state.games_completed += 1;
            self.outside.notify_all();
        }
        Ok(())
    }

    pub fn snapshot(&self) -> CourtState {
        *self.state.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_free_empty_court() {
        let court = Court::new();
        assert!(matches!(
            court.free_court(0),
            Err(MonitorError::InvariantViolation(_))
        ));
        assert!(matches!(
            court.start_play(0),
            Err(MonitorError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_single_game() {
        let court = Arc::new(Court::new());
        court.ask_court(0).unwrap();

        let partner = {
            let court = court.clone();
            thread::spawn(move || {
                court.ask_court(1).unwrap();
                court.start_play(1).unwrap();
            })
        };

        court.start_play(0).unwrap();
        partner.join().unwrap();
        assert_eq!(court.snapshot().playing, 2);

        court.free_court(0).unwrap();
        court.free_court(1).unwrap();

        let state = court.snapshot();
        assert_eq!(state.on_court, 0);
        assert_eq!(state.games_completed, 1);
    }

    #[test]
    fn test_third_player_waits_for_game_end() {
        let court = Arc::new(Court::new());
        court.ask_court(0).unwrap();
        court.ask_court(1).unwrap();

        let third = {
            let court = court.clone();
            thread::spawn(move || court.ask_court(2))
        };

        thread::sleep(Duration::from_millis(50));
        assert_eq!(court.snapshot().on_court, 2);

        court.start_play(0).unwrap();
        court.start_play(1).unwrap();
        court.free_court(0).unwrap();

        // one player still inside, game not over
        thread::sleep(Duration::from_millis(50));
        assert_eq!(court.snapshot().on_court, 1);

        court.free_court(1).unwrap();
        third.join().unwrap().unwrap();
        assert_eq!(court.snapshot().on_court, 1);
    }
}
