use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use fiefdom_protocol::{PlayerId, PlayerStatsSnapshot};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub turns_played: u32,
    /// Owned cell count sampled at the end of each of the player's turns.
    pub territory_history: Vec<u32>,
}

/// Per-player turn counters and territory evolution.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GameStats {
    records: BTreeMap<PlayerId, PlayerRecord>,
}

impl GameStats {
    pub fn record_turn(&mut self, player: PlayerId, territory: u32) {
        let record = self.records.entry(player).or_default();
        record.turns_played += 1;
        record.territory_history.push(territory);
    }

    pub fn get(&self, player: PlayerId) -> Option<&PlayerRecord> {
        self.records.get(&player)
    }

    pub fn turns_played(&self, player: PlayerId) -> u32 {
        self.records
            .get(&player)
            .map(|r| r.turns_played)
            .unwrap_or(0)
    }

    pub fn to_snapshot(&self) -> Vec<PlayerStatsSnapshot> {
        self.records
            .iter()
            .map(|(player, record)| PlayerStatsSnapshot {
                player: *player,
                turns_played: record.turns_played,
                territory_history: record.territory_history.clone(),
            })
            .collect()
    }

    pub fn from_snapshot(snap: &[PlayerStatsSnapshot]) -> Self {
        Self {
            records: snap
                .iter()
                .map(|s| {
                    (
                        s.player,
                        PlayerRecord {
                            turns_played: s.turns_played,
                            territory_history: s.territory_history.clone(),
                        },
                    )
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_accumulate_per_player() {
        let mut stats = GameStats::default();
        stats.record_turn(PlayerId(0), 9);
        stats.record_turn(PlayerId(1), 9);
        stats.record_turn(PlayerId(0), 12);

        assert_eq!(stats.turns_played(PlayerId(0)), 2);
        assert_eq!(stats.turns_played(PlayerId(1)), 1);
        assert_eq!(stats.get(PlayerId(0)).unwrap().territory_history, vec![9, 12]);
    }

    #[test]
    fn snapshot_roundtrip() {
        let mut stats = GameStats::default();
        stats.record_turn(PlayerId(2), 4);
        let back = GameStats::from_snapshot(&stats.to_snapshot());
        assert_eq!(back.turns_played(PlayerId(2)), 1);
    }
}
