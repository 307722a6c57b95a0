use serde::{Deserialize, Serialize};

/// The available speaking exercises
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    /// Complete one analogy per prompt under a short timer
    RapidFire,
    /// Speak on a topic while following changing energy targets
    Conductor,
    /// Weave random words into an ongoing speech
    TripleStep,
}

impl GameKind {
    /// Duration games end on a session clock instead of a step count
    pub fn is_continuous(&self) -> bool {
        !matches!(self, GameKind::RapidFire)
    }

    /// Tag sent in the `game_type` setting
    pub fn as_str(&self) -> &'static str {
        match self {
            GameKind::RapidFire => "rapid_fire",
            GameKind::Conductor => "conductor",
            GameKind::TripleStep => "triple_step",
        }
    }
}

impl std::fmt::Display for GameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameKind::RapidFire => write!(f, "Rapid Fire Analogies"),
            GameKind::Conductor => write!(f, "The Conductor"),
            GameKind::TripleStep => write!(f, "Triple Step"),
        }
    }
}

impl std::str::FromStr for GameKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "rapid_fire" | "analogies" => Ok(GameKind::RapidFire),
            "conductor" => Ok(GameKind::Conductor),
            "triple_step" => Ok(GameKind::TripleStep),
            other => Err(format!("Unknown game: {}", other)),
        }
    }
}

/// Word pool used by the triple step game
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("Unknown difficulty: {}", other)),
        }
    }
}

/// What the user is asked to respond to during one step
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Cue {
    /// A text prompt to complete
    Prompt(String),
    /// A target vocal energy level, 1 to 9
    Energy(u8),
    /// A word to integrate into the speech
    Word(String),
}

impl std::fmt::Display for Cue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cue::Prompt(prompt) => write!(f, "{}", prompt),
            Cue::Energy(level) => write!(f, "energy {}", level),
            Cue::Word(word) => write!(f, "{}", word),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_kind_parsing() {
        assert_eq!("rapid-fire".parse::<GameKind>(), Ok(GameKind::RapidFire));
        assert_eq!("Conductor".parse::<GameKind>(), Ok(GameKind::Conductor));
        assert_eq!("triple_step".parse::<GameKind>(), Ok(GameKind::TripleStep));
        assert!("karaoke".parse::<GameKind>().is_err());
    }

    #[test]
    fn test_continuous_games() {
        assert!(!GameKind::RapidFire.is_continuous());
        assert!(GameKind::Conductor.is_continuous());
        assert!(GameKind::TripleStep.is_continuous());
    }

    #[test]
    fn test_cue_display() {
        assert_eq!(Cue::Prompt("Time is like ___".into()).to_string(), "Time is like ___");
        assert_eq!(Cue::Energy(7).to_string(), "energy 7");
        assert_eq!("HARD".parse::<Difficulty>(), Ok(Difficulty::Hard));
    }
}
