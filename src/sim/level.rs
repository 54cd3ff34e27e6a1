/// Level text parser.
///
/// ## Format
///   `# ...`                  comment, ignored
///   `@parallax-layer <name>` background layer, drawn in order
///   `@music <name>`          level music
///   `@<other>`               ignored
///   anything else            a map row
///
/// ## Map legend
///   `A`..=`Z`  solid tile (letter picks the tile image)
///   ` `        empty
///   `0`        player spawn (mapped to the player template)
///   other      looked up in the manifest's character mappings
///
/// Width is the longest row; short rows are open to the right.

use std::collections::HashMap;

use crate::domain::tile::TileGrid;
use crate::error::AssetError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spawn {
    pub template: String,
    pub x: usize,
    pub y: usize,
}

#[derive(Clone, Debug)]
pub struct LevelDef {
    pub tiles: TileGrid,
    pub player: Spawn,
    /// Non-player spawns in row-major order.
    pub spawns: Vec<Spawn>,
    pub parallax_layers: Vec<String>,
    pub music: Option<String>,
}

pub const PLAYER_CHAR: char = '0';

pub fn parse_level(
    index: usize,
    text: &str,
    mappings: &HashMap<char, String>,
) -> Result<LevelDef, AssetError> {
    let mut rows: Vec<(usize, &str)> = Vec::new();
    let mut parallax_layers = Vec::new();
    let mut music = None;

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.starts_with('#') { continue; }
        if let Some(directive) = line.strip_prefix('@') {
            let mut parts = directive.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some("parallax-layer"), Some(name)) => parallax_layers.push(name.to_string()),
                (Some("music"), Some(name)) => music = Some(name.to_string()),
                _ => tracing::debug!(level = index, line = line_no + 1, "ignoring directive '{line}'"),
            }
            continue;
        }
        rows.push((line_no + 1, line));
    }

    let width = rows.iter().map(|(_, r)| r.chars().count()).max().unwrap_or(0);
    let mut tiles = TileGrid::new(width, rows.len());
    let mut player = None;
    let mut spawns = Vec::new();

    for (y, (line_no, row)) in rows.iter().enumerate() {
        for (x, ch) in row.chars().enumerate() {
            match ch {
                ' ' => {}
                'A'..='Z' => tiles.set(x, y, ch),
                _ => {
                    let template = mappings.get(&ch).ok_or(AssetError::UnmappedLevelChar {
                        level: index,
                        line: *line_no,
                        ch,
                    })?;
                    let spawn = Spawn { template: template.clone(), x, y };
                    if ch == PLAYER_CHAR {
                        player = Some(spawn);
                    } else {
                        spawns.push(spawn);
                    }
                }
            }
        }
    }

    let player = player.ok_or(AssetError::MissingPlayerSpawn(index))?;
    Ok(LevelDef { tiles, player, spawns, parallax_layers, music })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mappings() -> HashMap<char, String> {
        HashMap::from([
            ('0', "hero".to_string()),
            ('g', "grub".to_string()),
            ('*', "star".to_string()),
        ])
    }

    #[test]
    fn parses_rows_directives_and_spawns() {
        let text = "# level one\n@parallax-layer sky\n@parallax-layer hills\n@music theme\n  *\n0 g\nAAAAA\n";
        let def = parse_level(0, text, &mappings()).unwrap();
        assert_eq!(def.parallax_layers, vec!["sky", "hills"]);
        assert_eq!(def.music.as_deref(), Some("theme"));
        assert_eq!((def.tiles.width(), def.tiles.height()), (5, 3));
        assert_eq!(def.player, Spawn { template: "hero".into(), x: 0, y: 1 });
        assert_eq!(def.spawns.len(), 2);
        assert_eq!(def.spawns[0].template, "star");
        assert!(def.tiles.is_solid(4, 2));
        assert!(!def.tiles.is_solid(4, 0));
    }

    #[test]
    fn unknown_directive_is_ignored() {
        let def = parse_level(0, "@weather rain\n0\n", &mappings()).unwrap();
        assert_eq!(def.tiles.height(), 1);
    }

    #[test]
    fn unmapped_character_reports_line() {
        let err = parse_level(2, "# c\n0 ?\n", &mappings()).unwrap_err();
        assert!(matches!(err, AssetError::UnmappedLevelChar { level: 2, line: 2, ch: '?' }));
    }

    #[test]
    fn missing_player_is_an_error() {
        let err = parse_level(1, "AAA\n", &mappings()).unwrap_err();
        assert!(matches!(err, AssetError::MissingPlayerSpawn(1)));
    }
}
