// Wire protocol DTOs and conversions for client-facing messages.

use crate::domain::{ClientIntent, Entity, Player, StaticFrame, WorldFrame};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Payloads a client may send, discriminated by the required `eventkind`
/// field. Anything outside this closed set fails to decode.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "eventkind", rename_all = "lowercase")]
pub enum ClientIntentDto {
    Init { name: String, avatar: String },
    Keydown { key: String },
    Keyup { key: String },
    Click { x: i64, y: i64 },
}

impl From<ClientIntentDto> for ClientIntent {
    fn from(dto: ClientIntentDto) -> Self {
        match dto {
            ClientIntentDto::Init { name, avatar } => ClientIntent::Init { name, avatar },
            ClientIntentDto::Keydown { key } => ClientIntent::Keydown { key },
            ClientIntentDto::Keyup { key } => ClientIntent::Keyup { key },
            ClientIntentDto::Click { x, y } => ClientIntent::Click { x, y },
        }
    }
}

/// Decode failure for an inbound payload. Carries the session and the raw
/// text so the drop can be logged with full context instead of silently
/// ignored.
#[derive(Debug)]
pub struct ParseError {
    pub session_id: String,
    pub raw: String,
    pub source: serde_json::Error,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "session {} sent an undecodable payload {:?}: {}",
            self.session_id, self.raw, self.source
        )
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Decodes one raw client payload into an intent.
pub fn parse_intent(session_id: &str, raw: &str) -> Result<ClientIntent, ParseError> {
    serde_json::from_str::<ClientIntentDto>(raw)
        .map(ClientIntent::from)
        .map_err(|source| ParseError {
            session_id: session_id.to_string(),
            raw: raw.to_string(),
            source,
        })
}

/// Entity state as transmitted to clients. Action payloads stay server-side;
/// clients only ever see the resulting dialog on a player.
#[derive(Debug, Clone, Serialize)]
pub struct EntityDto {
    pub x: i64,
    pub y: i64,
    pub name: String,
    pub avatar: String,
    pub passable: bool,
}

impl From<&Entity> for EntityDto {
    fn from(entity: &Entity) -> Self {
        Self {
            x: entity.x,
            y: entity.y,
            name: entity.name.clone(),
            avatar: entity.avatar.clone(),
            passable: entity.passable,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerDto {
    pub x: i64,
    pub y: i64,
    pub name: String,
    pub avatar: String,
    pub change_x: i64,
    pub change_y: i64,
    pub facing_direction: &'static str,
    pub talking_to: Option<EntityDto>,
    pub dialog: Option<String>,
}

impl From<&Player> for PlayerDto {
    fn from(player: &Player) -> Self {
        Self {
            x: player.x,
            y: player.y,
            name: player.name.clone(),
            avatar: player.avatar.clone(),
            change_x: player.change_x,
            change_y: player.change_y,
            facing_direction: player.facing.as_str(),
            talking_to: player.talking_to.as_ref().map(EntityDto::from),
            dialog: player.dialog.clone(),
        }
    }
}

/// One-time snapshot sent to a session immediately after connect.
#[derive(Debug, Clone, Serialize)]
pub struct StaticSnapshotDto {
    #[serde(rename = "static")]
    pub static_entities: BTreeMap<String, EntityDto>,
}

impl From<&StaticFrame> for StaticSnapshotDto {
    fn from(frame: &StaticFrame) -> Self {
        Self {
            static_entities: frame
                .entities
                .iter()
                .map(|(id, e)| (id.clone(), EntityDto::from(e)))
                .collect(),
        }
    }
}

/// Snapshot sent to every session on every tick.
#[derive(Debug, Clone, Serialize)]
pub struct TickBroadcastDto {
    pub dynamic: BTreeMap<String, EntityDto>,
    pub players: BTreeMap<String, PlayerDto>,
}

impl From<&WorldFrame> for TickBroadcastDto {
    fn from(frame: &WorldFrame) -> Self {
        Self {
            dynamic: frame
                .dynamic
                .iter()
                .map(|(id, e)| (id.clone(), EntityDto::from(e)))
                .collect(),
            players: frame
                .players
                .iter()
                .map(|(id, p)| (id.clone(), PlayerDto::from(p)))
                .collect(),
        }
    }
}
