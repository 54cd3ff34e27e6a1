/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub general: GeneralConfig,
    pub physics: PhysicsConfig,
    pub player: PlayerConfig,
    pub boss: BossConfig,
    pub audio: AudioConfig,
    pub keys: KeyConfig,
    pub gamepad: GamepadConfig,
}

#[derive(Clone, Debug)]
pub struct GeneralConfig {
    /// Path of the asset manifest. Level paths inside it are relative to
    /// the manifest's directory.
    pub assets: PathBuf,
    pub log_file: PathBuf,
    pub frame_ms: u64,
    /// Longest frame fed to the simulation; longer stalls are clamped.
    pub max_frame_ms: u64,
    pub seed: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct PhysicsConfig {
    pub gravity: f32,         // px/ms²
    pub die_time_ms: u64,
    pub grub_speed: f32,
    pub fly_speed: f32,
    pub projectile_speed: f32,
    pub homing_speed: f32,
}

#[derive(Clone, Debug)]
pub struct PlayerConfig {
    pub max_speed: f32,
    pub jump_speed: f32,
    pub thrust: f32,          // px/ms², opposes gravity
    pub max_fuel: f32,
    pub fuel_burn_rate: f32,  // fuel per ms of jetpack
    pub lives: u32,
    pub ammo: u32,
    pub bullet_template: String,
}

#[derive(Clone, Debug)]
pub struct BossConfig {
    pub lives: u32,
    pub teleport_chance: f64,
    pub spit_interval_ms: u64,
    pub spit_follows: bool,
    pub homing_chance: f64,
    pub aim_chance: f64,
    pub spit_speed: f32,
    pub claw_offset: f32,
    pub spit_template: String,
    pub homing_template: String,
}

#[derive(Clone, Debug)]
pub struct AudioConfig {
    pub event_sounds: bool,
}

#[derive(Clone, Debug)]
pub struct KeyConfig {
    pub move_left: Vec<String>,
    pub move_right: Vec<String>,
    pub jump: Vec<String>,
    pub propel: Vec<String>,
    pub shoot: Vec<String>,
    pub restart: Vec<String>,
    pub stop: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub jump: Vec<String>,
    pub propel: Vec<String>,
    pub shoot: Vec<String>,
    pub restart: Vec<String>,
    pub stop: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    general: TomlGeneral,
    #[serde(default)]
    physics: TomlPhysics,
    #[serde(default)]
    player: TomlPlayer,
    #[serde(default)]
    boss: TomlBoss,
    #[serde(default)]
    audio: TomlAudio,
    #[serde(default)]
    keys: TomlKeys,
    #[serde(default)]
    gamepad: TomlGamepad,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_assets")]
    assets: String,
    #[serde(default = "default_log_file")]
    log_file: String,
    #[serde(default = "default_frame_ms")]
    frame_ms: u64,
    #[serde(default = "default_max_frame_ms")]
    max_frame_ms: u64,
    #[serde(default)]
    seed: Option<u64>,
}

#[derive(Deserialize, Debug)]
struct TomlPhysics {
    #[serde(default = "default_gravity")]
    gravity: f32,
    #[serde(default = "default_die_time")]
    die_time_ms: u64,
    #[serde(default = "default_grub_speed")]
    grub_speed: f32,
    #[serde(default = "default_fly_speed")]
    fly_speed: f32,
    #[serde(default = "default_projectile_speed")]
    projectile_speed: f32,
    #[serde(default = "default_homing_speed")]
    homing_speed: f32,
}

#[derive(Deserialize, Debug)]
struct TomlPlayer {
    #[serde(default = "default_max_speed")]
    max_speed: f32,
    #[serde(default = "default_jump_speed")]
    jump_speed: f32,
    #[serde(default = "default_thrust")]
    thrust: f32,
    #[serde(default = "default_max_fuel")]
    max_fuel: f32,
    #[serde(default = "default_burn_rate")]
    fuel_burn_rate: f32,
    #[serde(default = "default_lives")]
    lives: u32,
    #[serde(default = "default_ammo")]
    ammo: u32,
    #[serde(default = "default_bullet_template")]
    bullet_template: String,
}

#[derive(Deserialize, Debug)]
struct TomlBoss {
    #[serde(default = "default_boss_lives")]
    lives: u32,
    #[serde(default = "default_teleport_chance")]
    teleport_chance: f64,
    #[serde(default = "default_spit_interval")]
    spit_interval_ms: u64,
    #[serde(default = "default_true")]
    spit_follows: bool,
    #[serde(default = "default_homing_chance")]
    homing_chance: f64,
    #[serde(default = "default_aim_chance")]
    aim_chance: f64,
    #[serde(default = "default_spit_speed")]
    spit_speed: f32,
    #[serde(default = "default_claw_offset")]
    claw_offset: f32,
    #[serde(default = "default_spit_template")]
    spit_template: String,
    #[serde(default = "default_homing_template")]
    homing_template: String,
}

#[derive(Deserialize, Debug)]
struct TomlAudio {
    #[serde(default = "default_true")]
    event_sounds: bool,
}

#[derive(Deserialize, Debug)]
struct TomlKeys {
    #[serde(default = "default_key_left")]
    move_left: Vec<String>,
    #[serde(default = "default_key_right")]
    move_right: Vec<String>,
    #[serde(default = "default_key_jump")]
    jump: Vec<String>,
    #[serde(default = "default_key_propel")]
    propel: Vec<String>,
    #[serde(default = "default_key_shoot")]
    shoot: Vec<String>,
    #[serde(default = "default_key_restart")]
    restart: Vec<String>,
    #[serde(default)]
    stop: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_pad_jump")]
    jump: Vec<String>,
    #[serde(default = "default_pad_propel")]
    propel: Vec<String>,
    #[serde(default = "default_pad_shoot")]
    shoot: Vec<String>,
    #[serde(default = "default_pad_restart")]
    restart: Vec<String>,
    #[serde(default)]
    stop: Vec<String>,
}

// ── Defaults ──

fn default_true() -> bool { true }

fn default_assets() -> String { "assets/assets.toml".into() }
fn default_log_file() -> String { "jetpack-runner.log".into() }
fn default_frame_ms() -> u64 { 16 }
fn default_max_frame_ms() -> u64 { 50 }

fn default_gravity() -> f32 { 0.002 }
fn default_die_time() -> u64 { 1000 }
fn default_grub_speed() -> f32 { 0.05 }
fn default_fly_speed() -> f32 { 0.15 }
fn default_projectile_speed() -> f32 { 0.55 }
fn default_homing_speed() -> f32 { 0.05 }

fn default_max_speed() -> f32 { 0.35 }
fn default_jump_speed() -> f32 { 0.80 }
fn default_thrust() -> f32 { 0.003 }
fn default_max_fuel() -> f32 { 7500.0 }
fn default_burn_rate() -> f32 { 1.0 }
fn default_lives() -> u32 { 3 }
fn default_ammo() -> u32 { 3 }
fn default_bullet_template() -> String { "blast".into() }

fn default_boss_lives() -> u32 { 2 }
fn default_teleport_chance() -> f64 { 0.005 }
fn default_spit_interval() -> u64 { 1000 }
fn default_homing_chance() -> f64 { 0.15 }
fn default_aim_chance() -> f64 { 0.25 }
fn default_spit_speed() -> f32 { 0.35 }
fn default_claw_offset() -> f32 { 50.0 }
fn default_spit_template() -> String { "goo".into() }
fn default_homing_template() -> String { "goo2".into() }

fn default_key_left() -> Vec<String> { vec!["Left".into(), "a".into()] }
fn default_key_right() -> Vec<String> { vec!["Right".into(), "d".into()] }
fn default_key_jump() -> Vec<String> { vec!["Up".into(), "w".into()] }
fn default_key_propel() -> Vec<String> { vec!["Shift".into(), "j".into()] }
fn default_key_shoot() -> Vec<String> { vec!["Space".into()] }
fn default_key_restart() -> Vec<String> { vec!["r".into()] }

fn default_pad_jump() -> Vec<String> { vec!["A".into()] }
fn default_pad_propel() -> Vec<String> { vec!["R1".into(), "R2".into()] }
fn default_pad_shoot() -> Vec<String> { vec!["X".into(), "B".into()] }
fn default_pad_restart() -> Vec<String> { vec!["Start".into()] }

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            assets: default_assets(),
            log_file: default_log_file(),
            frame_ms: default_frame_ms(),
            max_frame_ms: default_max_frame_ms(),
            seed: None,
        }
    }
}

impl Default for TomlPhysics {
    fn default() -> Self {
        TomlPhysics {
            gravity: default_gravity(),
            die_time_ms: default_die_time(),
            grub_speed: default_grub_speed(),
            fly_speed: default_fly_speed(),
            projectile_speed: default_projectile_speed(),
            homing_speed: default_homing_speed(),
        }
    }
}

impl Default for TomlPlayer {
    fn default() -> Self {
        TomlPlayer {
            max_speed: default_max_speed(),
            jump_speed: default_jump_speed(),
            thrust: default_thrust(),
            max_fuel: default_max_fuel(),
            fuel_burn_rate: default_burn_rate(),
            lives: default_lives(),
            ammo: default_ammo(),
            bullet_template: default_bullet_template(),
        }
    }
}

impl Default for TomlBoss {
    fn default() -> Self {
        TomlBoss {
            lives: default_boss_lives(),
            teleport_chance: default_teleport_chance(),
            spit_interval_ms: default_spit_interval(),
            spit_follows: true,
            homing_chance: default_homing_chance(),
            aim_chance: default_aim_chance(),
            spit_speed: default_spit_speed(),
            claw_offset: default_claw_offset(),
            spit_template: default_spit_template(),
            homing_template: default_homing_template(),
        }
    }
}

impl Default for TomlAudio {
    fn default() -> Self {
        TomlAudio { event_sounds: true }
    }
}

impl Default for TomlKeys {
    fn default() -> Self {
        TomlKeys {
            move_left: default_key_left(),
            move_right: default_key_right(),
            jump: default_key_jump(),
            propel: default_key_propel(),
            shoot: default_key_shoot(),
            restart: default_key_restart(),
            stop: vec![],
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            jump: default_pad_jump(),
            propel: default_pad_propel(),
            shoot: default_pad_shoot(),
            restart: default_pad_restart(),
            stop: vec![],
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);

        // Resolve the manifest against the search dirs, like the config itself
        let assets_str = &toml_cfg.general.assets;
        let assets = if PathBuf::from(assets_str).is_absolute() {
            PathBuf::from(assets_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(assets_str))
                .find(|p| p.is_file())
                .unwrap_or_else(|| PathBuf::from(assets_str))
        };

        GameConfig::from_toml(toml_cfg, assets)
    }

    /// Parse a config document directly. Used by tests and by `load()`.
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        let cfg: TomlConfig = toml::from_str(text)?;
        let assets = PathBuf::from(&cfg.general.assets);
        Ok(GameConfig::from_toml(cfg, assets))
    }

    fn from_toml(t: TomlConfig, assets: PathBuf) -> Self {
        GameConfig {
            general: GeneralConfig {
                assets,
                log_file: PathBuf::from(t.general.log_file),
                frame_ms: t.general.frame_ms.max(1),
                max_frame_ms: t.general.max_frame_ms.max(1),
                seed: t.general.seed,
            },
            physics: PhysicsConfig {
                gravity: t.physics.gravity,
                die_time_ms: t.physics.die_time_ms,
                grub_speed: t.physics.grub_speed,
                fly_speed: t.physics.fly_speed,
                projectile_speed: t.physics.projectile_speed,
                homing_speed: t.physics.homing_speed,
            },
            player: PlayerConfig {
                max_speed: t.player.max_speed,
                jump_speed: t.player.jump_speed,
                thrust: t.player.thrust,
                max_fuel: t.player.max_fuel,
                fuel_burn_rate: t.player.fuel_burn_rate,
                lives: t.player.lives,
                ammo: t.player.ammo,
                bullet_template: t.player.bullet_template,
            },
            boss: BossConfig {
                lives: t.boss.lives,
                teleport_chance: t.boss.teleport_chance,
                spit_interval_ms: t.boss.spit_interval_ms.max(1),
                spit_follows: t.boss.spit_follows,
                homing_chance: t.boss.homing_chance,
                aim_chance: t.boss.aim_chance,
                spit_speed: t.boss.spit_speed,
                claw_offset: t.boss.claw_offset,
                spit_template: t.boss.spit_template,
                homing_template: t.boss.homing_template,
            },
            audio: AudioConfig {
                event_sounds: t.audio.event_sounds,
            },
            keys: KeyConfig {
                move_left: t.keys.move_left,
                move_right: t.keys.move_right,
                jump: t.keys.jump,
                propel: t.keys.propel,
                shoot: t.keys.shoot,
                restart: t.keys.restart,
                stop: t.keys.stop,
            },
            gamepad: GamepadConfig {
                jump: t.gamepad.jump,
                propel: t.gamepad.propel,
                shoot: t.gamepad.shoot,
                restart: t.gamepad.restart,
                stop: t.gamepad.stop,
            },
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        let t = TomlConfig::default();
        let assets = PathBuf::from(&t.general.assets);
        GameConfig::from_toml(t, assets)
    }
}

/// Candidate directories to search: exe dir + CWD + system paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/jetpack-runner)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/jetpack-runner");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}
