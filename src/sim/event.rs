/// Events emitted during a simulation step.
/// The presentation layer consumes these for sound and screen effects.

/// Audio cues. Playback belongs to the front-end.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Cue {
    Prize,
    Portal,
    Ammo,
    Boost,
    ExtraLife,
    Hurt,
    FinalDeath,
    Shoot,
    Hit,
}

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    Sound(Cue),
    LevelLoaded { level: usize },
    /// Ran past the last level; the map restarted at level 0.
    GameFinished,
    PlayerHurt { lives: u32 },
    /// Last life lost; counters were reset.
    GameReset,
    CreatureShot { id: u32 },
    BossSpat { id: u32 },
}
