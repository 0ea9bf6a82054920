//! The shared game state: players and tokens.

use std::collections::HashMap;

use tabletop_protocol::ClientId;

/// Hit points a player starts with.
pub const DEFAULT_HP: i64 = 20;

/// A participant, created by their first JOIN or by the first SET_HP that
/// targets them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub client_id: ClientId,
    pub name: String,
    /// Never negative. No upper bound.
    pub hp: i64,
}

/// A board piece. Always written whole; there is no partial update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub x: i64,
    pub y: i64,
}

/// Players keyed by client id, tokens keyed by token id.
#[derive(Debug, Default)]
pub struct GameState {
    players: HashMap<ClientId, Player>,
    tokens: HashMap<String, Token>,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the player if absent, otherwise renames them. HP is
    /// untouched either way.
    pub fn join(&mut self, client_id: &ClientId, name: String) -> &Player {
        let player = self
            .players
            .entry(client_id.clone())
            .or_insert_with(|| Player {
                client_id: client_id.clone(),
                name: String::new(),
                hp: DEFAULT_HP,
            });
        player.name = name;
        player
    }

    /// Applies `delta` to the target's HP, clamped at 0, and returns the
    /// new value. An unknown target is created first with
    /// [`DEFAULT_HP`], named after its id.
    pub fn adjust_hp(&mut self, target_id: &ClientId, delta: i64) -> i64 {
        let player = self
            .players
            .entry(target_id.clone())
            .or_insert_with(|| Player {
                client_id: target_id.clone(),
                name: target_id.to_string(),
                hp: DEFAULT_HP,
            });
        player.hp = player.hp.saturating_add(delta).max(0);
        player.hp
    }

    /// Places the token, replacing whatever position it had.
    pub fn move_token(&mut self, token_id: String, x: i64, y: i64) -> Token {
        let token = Token { x, y };
        self.tokens.insert(token_id, token);
        token
    }

    pub fn player(&self, client_id: &str) -> Option<&Player> {
        self.players.get(client_id)
    }

    pub fn token(&self, token_id: &str) -> Option<Token> {
        self.tokens.get(token_id).copied()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }
}
