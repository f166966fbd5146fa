use super::*;

const CONFIG: &str = r##"
[global]
anchor_image = "outputs/fal/idle_00/anchor_base.png"
match = "sprites/idle/idle_00.png"
constraints = "feet stay on the baseline"
negative = "blurry"
duration = 5
workers = 2

[[animation]]
name = "walk"
enabled = true
prompt = "walks to the right"
frame_indices = "2,4-6"
output_start = 1
pad_left_pct = 0.25
pad_top_px = 12
dest_dir = "sprites/walk"
prefix = "walk_"

[[animation]]
name = "idle"
enabled = true
prompt_variations = ["breathes", "blinks"]
constraints = "no camera movement"
single_frame = true
frame_indices = [3]
duration = "3"
pad_color = "#ffffff"

[[animation]]
name = "attack"
enabled = false
prompt = "swings"

[[animation]]
name = "jump"
enabled = true

[[animation]]
enabled = true
prompt = "nameless"

[[animation]]
name = "hurt"
enabled = true
prompt = "flinches"
output_indices = "0-2"
output_width = 3
match = "sprites/hurt/hurt_00.png"
"##;

fn names(items: &[BatchItem]) -> Vec<&str> {
    items.iter().map(|i| i.name.as_str()).collect()
}

#[test]
fn defaults_apply_when_global_is_sparse() {
    let cfg = BatchConfig::parse("[global]\nanchor_image = \"a.png\"\n").unwrap();
    let g = &cfg.global;
    assert_eq!(g.output_root, PathBuf::from("outputs/fal"));
    assert_eq!(g.extract_fps, 6);
    assert_eq!(g.pad_color, Rgb::CHROMA_GREEN);
    assert_eq!(g.output_width, 2);
    assert_eq!(g.resolution, "1080p");
    assert_eq!(g.duration.to_string(), "3");
    assert!(g.bg_remove);
    assert_eq!(g.workers, 3);
    assert_eq!(g.poll_seconds, 2.0);
    assert!(cfg.animation.is_empty());
}

#[test]
fn anchor_image_is_required() {
    let err = BatchConfig::parse("[global]\nmatch = \"m.png\"\n").unwrap_err();
    assert!(matches!(err, ReskinError::Config(_)), "{err}");
    let err = BatchConfig::parse("[global\n").unwrap_err();
    assert!(matches!(err, ReskinError::Config(_)), "{err}");
}

#[test]
fn runnable_items_skip_disabled_unnamed_and_promptless() {
    let cfg = BatchConfig::parse(CONFIG).unwrap();
    let items = cfg.items(&[]).unwrap();
    assert_eq!(names(&items), vec!["walk", "idle_v1", "idle_v2", "hurt"]);
}

#[test]
fn item_overrides_fall_back_to_global() {
    let cfg = BatchConfig::parse(CONFIG).unwrap();
    let items = cfg.items(&[]).unwrap();

    let walk = &items[0];
    assert_eq!(walk.prompt, "walks to the right. feet stay on the baseline");
    assert_eq!(walk.negative.as_deref(), Some("blurry"));
    assert_eq!(walk.duration, "5");
    assert_eq!(walk.frame_indices, Some(vec![2, 4, 5, 6]));
    assert_eq!(walk.naming, OutputNaming::Sequential { start: 1, width: 2 });
    assert_eq!(walk.match_sprite, Some(PathBuf::from("sprites/idle/idle_00.png")));
    assert!(walk.padding.is_set());
    assert_eq!(
        walk.padding.resolve(100, 200),
        Padding {
            top: 12,
            bottom: 0,
            left: 25,
            right: 0
        }
    );

    let idle = &items[1];
    assert_eq!(idle.prompt, "breathes. no camera movement");
    assert_eq!(idle.naming, OutputNaming::Single);
    assert_eq!(idle.frame_indices, Some(vec![3]));
    assert_eq!(idle.duration, "3");
    assert_eq!(idle.pad_color, Rgb::WHITE);
    assert!(!idle.padding.is_set());

    let hurt = &items[3];
    assert_eq!(
        hurt.naming,
        OutputNaming::Explicit {
            indices: vec![0, 1, 2],
            width: 3
        }
    );
    assert_eq!(hurt.match_sprite, Some(PathBuf::from("sprites/hurt/hurt_00.png")));
    assert_eq!(hurt.frame_indices, None);
}

#[test]
fn only_filter_matches_base_or_variation_names() {
    let cfg = BatchConfig::parse(CONFIG).unwrap();
    assert_eq!(
        names(&cfg.items(&["idle".to_owned()]).unwrap()),
        vec!["idle_v1", "idle_v2"]
    );
    assert_eq!(
        names(&cfg.items(&["idle_v2".to_owned(), "walk".to_owned()]).unwrap()),
        vec!["walk", "idle_v2"]
    );
    assert!(cfg.items(&["attack".to_owned()]).unwrap().is_empty());
}

#[test]
fn bad_index_spec_is_reported() {
    let text = "[global]\nanchor_image = \"a.png\"\n\n[[animation]]\nname = \"x\"\nenabled = true\nprompt = \"p\"\nframe_indices = \"1,b\"\n";
    let cfg = BatchConfig::parse(text).unwrap();
    assert!(cfg.items(&[]).is_err());
}
