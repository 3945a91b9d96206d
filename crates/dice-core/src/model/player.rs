use core::fmt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Player {
    Player1 = 0,
    Player2 = 1,
}

impl Player {
    pub const BOTH: [Player; 2] = [Player::Player1, Player::Player2];

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Player::Player1),
            1 => Some(Player::Player2),
            _ => None,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn opponent(self) -> Player {
        match self {
            Player::Player1 => Player::Player2,
            Player::Player2 => Player::Player1,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Player::Player1 => "player1",
            Player::Player2 => "player2",
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Player::Player1 => "Player 1",
            Player::Player2 => "Player 2",
        };
        f.write_str(label)
    }
}

/// Which action is legal next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    Rolling,
    Placing,
    Ended,
}

impl GamePhase {
    pub const fn as_str(self) -> &'static str {
        match self {
            GamePhase::Rolling => "rolling",
            GamePhase::Placing => "placing",
            GamePhase::Ended => "ended",
        }
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    Player1,
    Player2,
    Draw,
}

impl Winner {
    pub const fn from_scores(player1: u32, player2: u32) -> Self {
        if player1 > player2 {
            Winner::Player1
        } else if player2 > player1 {
            Winner::Player2
        } else {
            Winner::Draw
        }
    }

    pub const fn player(self) -> Option<Player> {
        match self {
            Winner::Player1 => Some(Player::Player1),
            Winner::Player2 => Some(Player::Player2),
            Winner::Draw => None,
        }
    }
}

impl From<Player> for Winner {
    fn from(player: Player) -> Self {
        match player {
            Player::Player1 => Winner::Player1,
            Player::Player2 => Winner::Player2,
        }
    }
}
