/// Asset manifest: images, sprite templates and levels.
///
/// The manifest is TOML:
///
/// ```toml
/// tile_size = 32
/// levels = ["levels/level0.txt"]
///
/// [mappings]            # level character -> sprite template
/// "0" = "hero"
///
/// [tiles]               # tile letter -> image (render hint)
/// A = "rock"
///
/// [images.rock]
/// solid = [32, 32]
/// color = [120, 110, 100]
///
/// [sprites.hero]
/// type = "Player"
/// [[sprites.hero.animations]]
/// name = "right"
/// frames = [{ sheet = "hero_run", rows = 1, cols = 2, duration = 100 }]
/// ```
///
/// Everything is validated here, so a loaded `Resources` can build any of
/// its levels without failing.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

use serde::Deserialize;

use crate::domain::animation::{Animation, AnimationSet};
use crate::domain::entity::{EntityKind, Template};
use crate::domain::image::Image;
use super::level::{parse_level, LevelDef};
use crate::error::AssetError;

// ── Manifest schema ──

#[derive(Deserialize, Debug)]
struct Manifest {
    tile_size: u32,
    levels: Vec<String>,
    #[serde(default)]
    mappings: HashMap<String, String>,
    #[serde(default)]
    tiles: HashMap<String, String>,
    #[serde(default)]
    images: HashMap<String, ImageDef>,
    /// Sorted so load order (and error order) is stable.
    #[serde(default)]
    sprites: BTreeMap<String, SpriteDef>,
}

#[derive(Deserialize, Debug)]
struct ImageDef {
    #[serde(default)]
    solid: Option<[u32; 2]>,
    #[serde(default)]
    mask: Option<Vec<String>>,
    #[serde(default = "default_scale")]
    scale: u32,
    #[serde(default = "default_color")]
    color: [u8; 3],
}

#[derive(Deserialize, Debug)]
struct SpriteDef {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    animations: Vec<AnimDef>,
}

#[derive(Deserialize, Debug)]
struct AnimDef {
    name: String,
    frames: Vec<FrameDef>,
}

#[derive(Deserialize, Debug)]
struct FrameDef {
    #[serde(default)]
    img: Option<String>,
    #[serde(default)]
    sheet: Option<String>,
    #[serde(default = "default_one")]
    rows: u32,
    #[serde(default = "default_one")]
    cols: u32,
    #[serde(default)]
    operators: Vec<String>,
    duration: u64,
}

fn default_scale() -> u32 { 1 }
fn default_one() -> u32 { 1 }
fn default_color() -> [u8; 3] { [255, 255, 255] }

// ══════════════════════════════════════════════════════════════
// Resources
// ══════════════════════════════════════════════════════════════

#[derive(Debug)]
pub struct Resources {
    pub tile_size: u32,
    templates: HashMap<String, Arc<Template>>,
    tile_images: HashMap<char, Arc<Image>>,
    levels: Vec<LevelDef>,
}

impl Resources {
    /// Read the manifest at `path`; level paths resolve against its directory.
    pub fn load(path: &Path) -> Result<Self, AssetError> {
        let base = path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
        let text = read_file(path)?;
        Resources::from_manifest(&text, |name| read_file(&base.join(name)))
    }

    /// Build from manifest text, fetching level files through `read_level`.
    pub fn from_manifest<F>(text: &str, read_level: F) -> Result<Self, AssetError>
    where
        F: Fn(&str) -> Result<String, AssetError>,
    {
        let manifest: Manifest = toml::from_str(text)?;
        if manifest.levels.is_empty() {
            return Err(AssetError::NoLevels);
        }

        let images = build_images(&manifest.images)?;

        let mut templates = HashMap::new();
        for (name, def) in &manifest.sprites {
            let template = build_template(name, def, &images)?;
            templates.insert(name.clone(), Arc::new(template));
        }

        let mut tile_images = HashMap::new();
        for (key, image) in &manifest.tiles {
            let ch = single_char(key)?;
            match images.get(image) {
                Some(img) => { tile_images.insert(ch, img.clone()); }
                None => tracing::warn!(tile = %ch, image = %image, "tile image not defined"),
            }
        }

        let mut mappings = HashMap::new();
        for (key, template) in &manifest.mappings {
            let ch = single_char(key)?;
            if !templates.contains_key(template) {
                return Err(AssetError::UnknownTemplate(template.clone()));
            }
            mappings.insert(ch, template.clone());
        }

        let mut levels = Vec::with_capacity(manifest.levels.len());
        for (index, file) in manifest.levels.iter().enumerate() {
            let def = parse_level(index, &read_level(file)?, &mappings)?;
            check_level_templates(index, &def, &templates)?;
            levels.push(def);
        }

        tracing::info!(
            templates = templates.len(),
            levels = levels.len(),
            tile_size = manifest.tile_size,
            "assets loaded"
        );
        Ok(Resources { tile_size: manifest.tile_size.max(1), templates, tile_images, levels })
    }

    pub fn template(&self, name: &str) -> Option<&Arc<Template>> {
        self.templates.get(name)
    }

    pub fn level(&self, index: usize) -> Option<&LevelDef> {
        self.levels.get(index)
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn tile_image(&self, tile: char) -> Option<&Arc<Image>> {
        self.tile_images.get(&tile)
    }
}

fn read_file(path: &Path) -> Result<String, AssetError> {
    std::fs::read_to_string(path).map_err(|source| AssetError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn single_char(key: &str) -> Result<char, AssetError> {
    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Ok(ch),
        _ => Err(AssetError::BadMapping(key.to_string())),
    }
}

fn build_images(defs: &HashMap<String, ImageDef>) -> Result<HashMap<String, Arc<Image>>, AssetError> {
    let mut images = HashMap::with_capacity(defs.len());
    for (name, def) in defs {
        let img = match (&def.solid, &def.mask) {
            (Some([w, h]), None) => Image::solid(*w, *h, def.color),
            (None, Some(rows)) => Image::from_mask(rows, def.scale, def.color),
            _ => return Err(AssetError::BadImage(name.clone())),
        };
        images.insert(name.clone(), Arc::new(img));
    }
    Ok(images)
}

fn build_template(
    name: &str,
    def: &SpriteDef,
    images: &HashMap<String, Arc<Image>>,
) -> Result<Template, AssetError> {
    let kind = EntityKind::from_tag(&def.kind).ok_or_else(|| AssetError::UnknownEntityKind {
        template: name.to_string(),
        tag: def.kind.clone(),
    })?;

    let mut anims = Vec::with_capacity(def.animations.len());
    for anim in &def.animations {
        let mut frames = Vec::new();
        for frame in &anim.frames {
            for img in frame_images(name, frame, images)? {
                frames.push((apply_operators(name, img, &frame.operators), frame.duration));
            }
        }
        if frames.is_empty() {
            return Err(AssetError::EmptyAnimation { template: name.into(), animation: anim.name.clone() });
        }
        let built = Animation::new(anim.name.clone(), frames).ok_or_else(|| AssetError::BadFrameDuration {
            template: name.into(),
            animation: anim.name.clone(),
        })?;
        anims.push(built);
    }

    let anims = AnimationSet::new(anims).ok_or_else(|| AssetError::NoAnimations(name.into()))?;
    Ok(Template { name: name.to_string(), kind, anims: Arc::new(anims) })
}

/// The image(s) one frame entry contributes: a single image, or every cell
/// of a sheet in row-major order.
fn frame_images(
    template: &str,
    frame: &FrameDef,
    images: &HashMap<String, Arc<Image>>,
) -> Result<Vec<Arc<Image>>, AssetError> {
    let lookup = |key: &str| {
        images.get(key).cloned().ok_or_else(|| AssetError::MissingImage {
            template: template.to_string(),
            image: key.to_string(),
        })
    };
    if let Some(sheet) = &frame.sheet {
        let img = lookup(sheet)?;
        let cells = img.slice(frame.rows, frame.cols).ok_or_else(|| AssetError::BadSheet {
            image: sheet.clone(),
            width: img.width(),
            height: img.height(),
            rows: frame.rows,
            cols: frame.cols,
        })?;
        return Ok(cells.into_iter().map(Arc::new).collect());
    }
    match &frame.img {
        Some(key) => Ok(vec![lookup(key)?]),
        None => Err(AssetError::MissingImage { template: template.to_string(), image: String::new() }),
    }
}

fn apply_operators(template: &str, img: Arc<Image>, operators: &[String]) -> Arc<Image> {
    operators.iter().fold(img, |img, op| match op.as_str() {
        "mirror" => Arc::new(img.mirrored()),
        "flip" => Arc::new(img.flipped()),
        other => {
            tracing::warn!(template, operator = other, "unknown image operator ignored");
            img
        }
    })
}

fn check_level_templates(
    index: usize,
    def: &LevelDef,
    templates: &HashMap<String, Arc<Template>>,
) -> Result<(), AssetError> {
    let player = templates
        .get(&def.player.template)
        .ok_or_else(|| AssetError::UnknownTemplate(def.player.template.clone()))?;
    if player.kind != EntityKind::Player {
        return Err(AssetError::PlayerTemplateKind(def.player.template.clone()));
    }
    for spawn in &def.spawns {
        let t = templates
            .get(&spawn.template)
            .ok_or_else(|| AssetError::UnknownTemplate(spawn.template.clone()))?;
        if t.kind == EntityKind::Player {
            return Err(AssetError::UnexpectedPlayer { level: index, template: spawn.template.clone() });
        }
    }
    Ok(())
}

// ══════════════════════════════════════════════════════════════
// Background loading
// ══════════════════════════════════════════════════════════════

/// Loads a manifest on a worker thread. Poll once per frame; the result is
/// delivered exactly once.
pub struct AssetLoader {
    receiver: Receiver<Result<Resources, AssetError>>,
}

impl AssetLoader {
    pub fn spawn(path: PathBuf) -> Self {
        let (tx, rx) = channel();
        thread::spawn(move || {
            let _ = tx.send(Resources::load(&path));
        });
        AssetLoader { receiver: rx }
    }

    pub fn poll(&self) -> Option<Result<Resources, AssetError>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(AssetError::LoaderGone)),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Small but complete asset set used by the simulation tests.
    pub(crate) const MANIFEST: &str = r#"
tile_size = 32
levels = ["level0", "level1"]

[mappings]
"0" = "hero"
g = "grub"
f = "fly"
"*" = "star"
h = "heart"
a = "ammo"
p = "fuel"
"+" = "life"
m = "note"
l = "lava"
b = "boss"
x = "wall_bullet"

[tiles]
A = "rock"

[images.rock]
solid = [32, 32]

[images.body]
solid = [16, 32]

[images.small]
solid = [8, 8]

[images.critter]
solid = [16, 16]

[images.strip]
mask = ["X.X.", "XXXX"]
scale = 4

[sprites.hero]
type = "Player"
[[sprites.hero.animations]]
name = "stillRight"
frames = [{ img = "body", duration = 100 }]
[[sprites.hero.animations]]
name = "stillLeft"
frames = [{ img = "body", duration = 100, operators = ["mirror"] }]
[[sprites.hero.animations]]
name = "right"
frames = [{ img = "body", duration = 100 }]
[[sprites.hero.animations]]
name = "left"
frames = [{ img = "body", duration = 100 }]
[[sprites.hero.animations]]
name = "jetRight"
frames = [{ img = "body", duration = 100 }]
[[sprites.hero.animations]]
name = "jetLeft"
frames = [{ img = "body", duration = 100 }]
[[sprites.hero.animations]]
name = "deadRight"
frames = [{ img = "body", duration = 100, operators = ["flip"] }]
[[sprites.hero.animations]]
name = "deadLeft"
frames = [{ img = "body", duration = 100, operators = ["flip"] }]

[sprites.grub]
type = "Grub"
[[sprites.grub.animations]]
name = "left"
frames = [{ sheet = "strip", rows = 1, cols = 2, duration = 80 }]
[[sprites.grub.animations]]
name = "right"
frames = [{ sheet = "strip", rows = 1, cols = 2, duration = 80, operators = ["mirror"] }]
[[sprites.grub.animations]]
name = "deadLeft"
frames = [{ img = "critter", duration = 100, operators = ["flip"] }]
[[sprites.grub.animations]]
name = "deadRight"
frames = [{ img = "critter", duration = 100, operators = ["flip"] }]

[sprites.fly]
type = "Fly"
[[sprites.fly.animations]]
name = "left"
frames = [{ img = "critter", duration = 100 }]

[sprites.lava]
type = "Lava"
[[sprites.lava.animations]]
name = "default"
frames = [{ img = "critter", duration = 100 }]

[sprites.boss]
type = "FinalBoss"
[[sprites.boss.animations]]
name = "left"
frames = [{ img = "rock", duration = 100 }]

[sprites.star]
type = "Star"
[[sprites.star.animations]]
name = "spin"
frames = [{ img = "small", duration = 100 }, { img = "small", duration = 100, operators = ["mirror"] }]

[sprites.heart]
type = "Heart"
[[sprites.heart.animations]]
name = "default"
frames = [{ img = "small", duration = 100 }]

[sprites.ammo]
type = "AmmoBox"
[[sprites.ammo.animations]]
name = "default"
frames = [{ img = "small", duration = 100 }]

[sprites.fuel]
type = "Power"
[[sprites.fuel.animations]]
name = "default"
frames = [{ img = "small", duration = 100 }]

[sprites.life]
type = "PowerUp"
[[sprites.life.animations]]
name = "default"
frames = [{ img = "small", duration = 100 }]

[sprites.note]
type = "Music"
[[sprites.note.animations]]
name = "default"
frames = [{ img = "small", duration = 100 }]

[sprites.blast]
type = "Bullet"
[[sprites.blast.animations]]
name = "default"
frames = [{ img = "small", duration = 100 }]

[sprites.wall_bullet]
type = "Projectile"
[[sprites.wall_bullet.animations]]
name = "default"
frames = [{ img = "small", duration = 100 }]

[sprites.goo]
type = "EnemyProjectile"
[[sprites.goo.animations]]
name = "default"
frames = [{ img = "small", duration = 100 }]

[sprites.goo2]
type = "EnemyProjectile"
[[sprites.goo2.animations]]
name = "default"
frames = [{ img = "small", duration = 100 }]
"#;

    pub(crate) fn fixture(levels: &[&str]) -> Resources {
        let levels: Vec<String> = levels.iter().map(|l| l.to_string()).collect();
        let manifest = MANIFEST.replace(
            r#"levels = ["level0", "level1"]"#,
            &format!(
                "levels = [{}]",
                (0..levels.len()).map(|i| format!("\"level{i}\"")).collect::<Vec<_>>().join(", ")
            ),
        );
        Resources::from_manifest(&manifest, |name| {
            let idx: usize = name.trim_start_matches("level").parse().unwrap();
            Ok(levels[idx].clone())
        })
        .unwrap()
    }

    #[test]
    fn builds_templates_and_levels() {
        let res = fixture(&["0 g\nAAA\n"]);
        assert_eq!(res.tile_size, 32);
        assert_eq!(res.level_count(), 1);
        let grub = res.template("grub").unwrap();
        assert_eq!(grub.kind, EntityKind::Grub);
        // sheet 16x8 split into two 8x8 cells
        assert_eq!(grub.anims.get(0).frames().len(), 2);
        assert_eq!(grub.anims.get(0).frames()[0].image.width(), 8);
        assert!(res.tile_image('A').is_some());
    }

    #[test]
    fn first_animation_is_initial() {
        let res = fixture(&["0\n"]);
        let hero = res.template("hero").unwrap();
        assert_eq!(hero.anims.get(0).name(), "stillRight");
    }

    #[test]
    fn unknown_type_tag_is_fatal() {
        let bad = MANIFEST.replace("type = \"Fly\"", "type = \"Dragon\"");
        let err = Resources::from_manifest(&bad, |_| Ok("0\n".to_string())).unwrap_err();
        assert!(matches!(err, AssetError::UnknownEntityKind { ref tag, .. } if tag == "Dragon"));
    }

    #[test]
    fn uneven_sheet_is_rejected() {
        let bad = MANIFEST.replacen("rows = 1, cols = 2", "rows = 1, cols = 3", 1);
        let err = Resources::from_manifest(&bad, |_| Ok("0\n".to_string())).unwrap_err();
        assert!(matches!(err, AssetError::BadSheet { cols: 3, .. }));
    }

    #[test]
    fn zero_duration_is_rejected() {
        let bad = MANIFEST.replacen("{ img = \"critter\", duration = 100 }", "{ img = \"critter\", duration = 0 }", 1);
        let err = Resources::from_manifest(&bad, |_| Ok("0\n".to_string())).unwrap_err();
        assert!(matches!(err, AssetError::BadFrameDuration { .. }));
    }

    #[test]
    fn missing_level_file_propagates() {
        let err = Resources::from_manifest(MANIFEST, |name| Err(AssetError::Io {
            path: name.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        }))
        .unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
    }

    #[test]
    fn loader_reports_missing_manifest() {
        let loader = AssetLoader::spawn(PathBuf::from("/nonexistent/assets.toml"));
        let result = loop {
            if let Some(r) = loader.poll() { break r; }
            thread::sleep(std::time::Duration::from_millis(1));
        };
        assert!(matches!(result, Err(AssetError::Io { .. })));
    }
}
