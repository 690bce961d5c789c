use crate::error::RecordError;

/// Premier League 2024/25 clubs, indexed by FPL team id (1-based).
pub const TEAM_NAMES: [&str; 20] = [
    "Arsenal",
    "Aston Villa",
    "Bournemouth",
    "Brentford",
    "Brighton",
    "Chelsea",
    "Crystal Palace",
    "Everton",
    "Fulham",
    "Ipswich",
    "Leicester",
    "Liverpool",
    "Man City",
    "Man Utd",
    "Newcastle",
    "Nott'm Forest",
    "Southampton",
    "Spurs",
    "West Ham",
    "Wolves",
];

pub fn team_name(team_id: u32) -> Result<&'static str, RecordError> {
    let idx = (team_id as usize)
        .checked_sub(1)
        .ok_or(RecordError::UnknownTeam { team_id })?;
    TEAM_NAMES
        .get(idx)
        .copied()
        .ok_or(RecordError::UnknownTeam { team_id })
}

/// Compare a feed's own team list against the fixed table.
/// Returns one human readable line per disagreement.
pub fn table_mismatches<'a, I>(feed_teams: I) -> Vec<String>
where
    I: IntoIterator<Item = (u32, &'a str)>,
{
    let mut out = Vec::new();
    for (id, name) in feed_teams {
        match team_name(id) {
            Ok(known) if known.eq_ignore_ascii_case(name.trim()) => {}
            Ok(known) => out.push(format!("team {id}: feed says {name:?}, table says {known:?}")),
            Err(_) => out.push(format!("team {id} ({name}) is not in the table")),
        }
    }
    out
}
