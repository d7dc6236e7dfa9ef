use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelId(pub String);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    pub team_id: TeamId,
    pub name: String,
    #[serde(default)]
    pub display_name: String,
}

/// Which channel collects recognition posts for each team.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChannelDirectory {
    channels: HashMap<TeamId, ChannelId>,
}

impl ChannelDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, team_id: TeamId, channel_id: ChannelId) {
        self.channels.insert(team_id, channel_id);
    }

    pub fn channel_for(&self, team_id: &TeamId) -> Option<&ChannelId> {
        self.channels.get(team_id)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

impl FromIterator<(TeamId, ChannelId)> for ChannelDirectory {
    fn from_iter<I: IntoIterator<Item = (TeamId, ChannelId)>>(iter: I) -> Self {
        Self { channels: iter.into_iter().collect() }
    }
}
