// tests/document_tests.rs

use floorgrid::{tile, ArchetypeCatalog, EditorSession, Map, Mirror, ModuleArchetype, Rotation};
use std::fs;
use std::path::PathBuf;

fn catalog() -> ArchetypeCatalog {
    let mut cat = ArchetypeCatalog::new();
    cat.insert(ModuleArchetype::new("hall", 2, 1));
    cat.insert(ModuleArchetype::new("room", 3, 3));
    cat.insert(ModuleArchetype::new("closet", 1, 1));
    cat
}

fn build_map(cat: &ArchetypeCatalog) -> Map {
    let mut map = Map::new("manor");
    let mut session = EditorSession::new();

    session.pick_archetype(&mut map, cat.get("hall").unwrap().clone());
    session.press(&mut map, tile(0, 0));
    session.release(&mut map);

    session.pick_archetype(&mut map, cat.get("room").unwrap().clone());
    session.rotate_working_set(&mut map, floorgrid::Spin::Clockwise);
    session.mirror_working_set_horizontal(&mut map);
    session.hover(&mut map, tile(10, 4));
    session.press(&mut map, tile(10, 4));
    session.release(&mut map);

    let upper = map.add_layer(floorgrid::Layer::new("upper"));
    map.layer_mut(upper).unwrap().visible = false;
    session.set_active_layer(&map, upper);
    session.pick_archetype(&mut map, cat.get("closet").unwrap().clone());
    session.hover(&mut map, tile(-3, 7));
    session.press(&mut map, tile(-3, 7));
    session.release(&mut map);

    map
}

#[test]
fn round_trip_reproduces_every_persisted_field() {
    let cat = catalog();
    let map = build_map(&cat);

    let json = map.to_document_string().expect("encode");
    let mut reloaded = Map::load_str(&json).expect("decode");
    let missing = reloaded.link_archetypes(&cat);
    assert!(missing.is_empty());

    assert_eq!(reloaded.name, map.name);
    assert_eq!(reloaded.layer_count(), map.layer_count());
    for (orig, back) in map.layers().iter().zip(reloaded.layers()) {
        assert_eq!(back.name, orig.name);
        assert_eq!(back.visible, orig.visible);
        assert_eq!(back.show_shadows, orig.show_shadows);
        assert_eq!(back.len(), orig.len());
        for (om, bm) in orig.modules().iter().zip(back.modules()) {
            assert_eq!(bm.module_key(), om.module_key());
            assert_eq!(bm.position(), om.position());
            assert_eq!(bm.rotation(), om.rotation());
            assert_eq!(bm.mirror(), om.mirror());
            assert!(bm.is_resolved());
            // transient flags never round-trip
            assert!(!bm.is_selected());
            assert!(!bm.is_in_hand());
        }
    }
}

#[test]
fn save_and_load_through_a_file() -> anyhow::Result<()> {
    let cat = catalog();
    let mut map = build_map(&cat);

    let mut path = PathBuf::from(std::env::temp_dir());
    path.push(format!("floorgrid_roundtrip_{}.json", std::process::id()));

    map.save(&path)?;
    assert_eq!(map.source_path.as_deref(), Some(path.as_path()));

    let mut reloaded = Map::load(&path)?;
    assert_eq!(reloaded.source_path.as_deref(), Some(path.as_path()));
    reloaded.link_archetypes(&cat);
    assert_eq!(reloaded.module_count(), map.module_count());

    fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn documents_never_contain_transient_or_derived_data() {
    let cat = catalog();
    let map = build_map(&cat);
    let json = map.to_document_string().expect("encode");

    for forbidden in ["width", "height", "selected", "inHand", "marked", "dirty"] {
        assert!(
            !json.contains(forbidden),
            "document leaked {forbidden:?}: {json}"
        );
    }
    assert!(json.contains("moduleKey"));
    assert!(json.contains("mapName"));
    assert!(json.contains("isVisible"));
    assert!(json.contains("showShadows"));
}

#[test]
fn unresolved_keys_survive_a_round_trip_unchanged() {
    let doc = r#"{
      "mapName": "partial",
      "layers": [
        { "name": "L", "modules": [
          { "moduleKey": "hall", "position": { "x": 1, "y": 1 } },
          { "moduleKey": "missing_pack_piece", "position": { "x": 5, "y": 5 },
            "rotation": 2, "mirror": 3 }
        ] }
      ]
    }"#;

    let mut map = Map::load_str(doc).expect("decode");
    let missing = map.link_archetypes(&catalog());
    assert_eq!(missing, vec!["missing_pack_piece".to_string()]);

    // the unresolved instance is inert but keeps its persisted state
    let layer = &map.layers()[0];
    assert!(layer.is_tile_occupied(tile(1, 1)));
    assert!(!layer.is_tile_occupied(tile(5, 5)));

    let json = map.to_document_string().expect("encode");
    let again = Map::load_str(&json).expect("re-decode");
    let ghost = &again.layers()[0].modules()[1];
    assert_eq!(ghost.module_key(), "missing_pack_piece");
    assert_eq!(ghost.position(), tile(5, 5));
    assert_eq!(ghost.rotation(), Rotation::R180);
    assert_eq!(ghost.mirror(), Mirror::Both);
}

#[test]
fn load_rejects_non_json_files() {
    let err = Map::load("plan.tmx").expect_err("expected load failure");
    let chain = format!("{err:#}");
    assert!(chain.contains("unsupported file format"), "{chain}");
}
