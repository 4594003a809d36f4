//! Demo driver: generate a mission map and print it.
//!
//! Usage: `skirmish-core [template.json] [seed] [mission-index]`
//! With no arguments a default 48x48 classic mission is generated.

use std::path::Path;

use anyhow::{Context, Result};
use glam::IVec2;
use tracing::info;

use skirmish_core::entity::PickupKind;
use skirmish_core::logging;
use skirmish_core::map::access::TileClass;
use skirmish_core::map::build::{self, GeneratedMission};
use skirmish_core::mission::{MissionSeed, MissionTemplate};
use skirmish_core::tile::real_to_tile;

fn main() -> Result<()> {
    logging::init_tracing_default();

    let args: Vec<String> = std::env::args().collect();
    let template = match args.get(1) {
        Some(path) => MissionTemplate::load_file(Path::new(path))
            .with_context(|| format!("loading mission template {path}"))?,
        None => MissionTemplate::default_classic(IVec2::new(48, 48)),
    };
    let seed = MissionSeed {
        seed: args.get(2).map(|s| s.parse()).transpose()?.unwrap_or(42),
    };
    let mission_index = args.get(3).map(|s| s.parse()).transpose()?.unwrap_or(0);

    let mission = build::load(&template, &seed, mission_index)
        .context("mission generation failed")?;
    print_map(&mission);

    info!(
        explorable = mission.map.explorable_tiles,
        props = mission.store.props.len(),
        objectives = mission.objectives.len(),
        "done"
    );
    Ok(())
}

fn print_map(mission: &GeneratedMission) {
    let map = &mission.map;
    let mut rows: Vec<Vec<char>> = (0..map.size.y)
        .map(|y| {
            (0..map.size.x)
                .map(|x| {
                    let pos = IVec2::new(x, y);
                    match map.tile_class(pos) {
                        TileClass::Wall => '#',
                        TileClass::Door => '+',
                        TileClass::Room => {
                            if map.real_pos_is_high_access(skirmish_core::tile::tile_center(pos)) {
                                'r'
                            } else {
                                'o'
                            }
                        }
                        TileClass::Square => 's',
                        TileClass::Nothing => ' ',
                        TileClass::Floor => '.',
                    }
                })
                .collect()
        })
        .collect();

    for prop in &mission.store.props {
        let t = real_to_tile(prop.pos);
        if !map.contains_tile(t) {
            continue;
        }
        rows[t.y as usize][t.x as usize] = match prop.pickup {
            Some(PickupKind::Keycard(k)) => char::from(b'A' + k),
            Some(PickupKind::Jewel { .. }) => '*',
            Some(PickupKind::Health) => 'h',
            None => '%',
        };
    }
    for y in map.exit_start.y..=map.exit_end.y {
        for x in map.exit_start.x..=map.exit_end.x {
            let edge = y == map.exit_start.y
                || y == map.exit_end.y
                || x == map.exit_start.x
                || x == map.exit_end.x;
            if edge && rows[y as usize][x as usize] == '.' {
                rows[y as usize][x as usize] = 'x';
            }
        }
    }

    for row in rows {
        println!("{}", row.into_iter().collect::<String>());
    }
    for (i, obj) in mission.objectives.iter().enumerate() {
        println!(
            "objective {i}: {:?} {}/{} placed",
            obj.kind, obj.required, obj.placed
        );
    }
}
