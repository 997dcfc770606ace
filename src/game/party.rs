//! Party roster: species, members and the eligibility rules phases consult.

use crate::rng::RandomSource;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest party a run may hold.
pub const MAX_PARTY: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    Sproutling,
    Thornback,
    Emberkit,
    Blazefang,
    Ripplet,
    Tidecrest,
    Pebblit,
    Boulderox,
    /// Boss hiding in trapped chests.
    Chestling,
}

impl Species {
    pub const ALL: [Species; 9] = [
        Species::Sproutling,
        Species::Thornback,
        Species::Emberkit,
        Species::Blazefang,
        Species::Ripplet,
        Species::Tidecrest,
        Species::Pebblit,
        Species::Boulderox,
        Species::Chestling,
    ];

    /// Species a new run may start with.
    pub const STARTERS: [Species; 4] = [
        Species::Sproutling,
        Species::Emberkit,
        Species::Ripplet,
        Species::Pebblit,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Species::Sproutling => "sproutling",
            Species::Thornback => "thornback",
            Species::Emberkit => "emberkit",
            Species::Blazefang => "blazefang",
            Species::Ripplet => "ripplet",
            Species::Tidecrest => "tidecrest",
            Species::Pebblit => "pebblit",
            Species::Boulderox => "boulderox",
            Species::Chestling => "chestling",
        }
    }

    pub fn from_name(name: &str) -> Option<Species> {
        Species::ALL
            .into_iter()
            .find(|species| species.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Level at which this species evolves, and what into.
    pub fn evolution(self) -> Option<(u32, Species)> {
        match self {
            Species::Sproutling => Some((16, Species::Thornback)),
            Species::Emberkit => Some((16, Species::Blazefang)),
            Species::Ripplet => Some((18, Species::Tidecrest)),
            Species::Pebblit => Some((20, Species::Boulderox)),
            _ => None,
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub species: Species,
    pub level: u32,
    #[serde(default)]
    pub fainted: bool,
}

impl Member {
    pub fn new(species: Species, level: u32) -> Self {
        Self {
            species,
            level,
            fainted: false,
        }
    }

    pub fn allowed_in_battle(&self) -> bool {
        !self.fainted
    }

    /// Species this member is ready to evolve into at its current level.
    pub fn pending_evolution(&self) -> Option<Species> {
        self.species
            .evolution()
            .filter(|(at, _)| self.level >= *at)
            .map(|(_, into)| into)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    members: Vec<Member>,
}

impl Party {
    /// Build a party, keeping at most [`MAX_PARTY`] members.
    pub fn new(members: impl IntoIterator<Item = Member>) -> Self {
        Self {
            members: members.into_iter().take(MAX_PARTY).collect(),
        }
    }

    /// Roll `count` distinct starters at `level`. Consumes one draw per member.
    pub fn roll_starters<R: RandomSource + ?Sized>(rng: &mut R, count: usize, level: u32) -> Self {
        let mut pool: Vec<Species> = Species::STARTERS.to_vec();
        let mut members = Vec::new();
        while members.len() < count.min(MAX_PARTY) && !pool.is_empty() {
            let index = rng.next_int(pool.len() as u32) as usize;
            members.push(Member::new(pool.remove(index), level));
        }
        Self { members }
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn member(&self, index: usize) -> Option<&Member> {
        self.members.get(index)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Number of members that may still take part in a battle.
    pub fn allowed_in_battle(&self) -> usize {
        self.members
            .iter()
            .filter(|member| member.allowed_in_battle())
            .count()
    }

    /// Highest-level member still allowed in battle. Ties go to the earlier slot.
    pub fn strongest_eligible(&self) -> Option<usize> {
        self.members
            .iter()
            .enumerate()
            .filter(|(_, member)| member.allowed_in_battle())
            .fold(None, |best: Option<(usize, u32)>, (index, member)| match best {
                Some((_, level)) if level >= member.level => best,
                _ => Some((index, member.level)),
            })
            .map(|(index, _)| index)
    }

    /// Faint the member at `index`.
    pub fn knock_out(&mut self, index: usize) -> Option<&Member> {
        let member = self.members.get_mut(index)?;
        member.fainted = true;
        Some(member)
    }

    /// Add `levels` to every member allowed in battle. Returns the slots that now have an
    /// evolution pending.
    pub fn gain_levels(&mut self, levels: u32) -> Vec<usize> {
        let mut pending = Vec::new();
        for (index, member) in self.members.iter_mut().enumerate() {
            if !member.allowed_in_battle() {
                continue;
            }
            let before = member.pending_evolution();
            member.level = member.level.saturating_add(levels);
            if before.is_none() && member.pending_evolution().is_some() {
                pending.push(index);
            }
        }
        pending
    }

    /// Evolve the member at `index` if it is ready. Returns the new species.
    pub fn evolve(&mut self, index: usize) -> Option<Species> {
        let member = self.members.get_mut(index)?;
        let into = member.pending_evolution()?;
        member.species = into;
        Some(into)
    }

    /// Revive every fainted member.
    pub fn restore(&mut self) {
        for member in &mut self.members {
            member.fainted = false;
        }
    }
}
