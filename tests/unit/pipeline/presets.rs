use super::*;

#[test]
fn nearest_ratio_picks_closest_entry() {
    let p = GenerationPresets::default();
    assert_eq!(p.nearest_aspect_ratio(1920, 1080), "16:9");
    assert_eq!(p.nearest_aspect_ratio(256, 256), "1:1");
    assert_eq!(p.nearest_aspect_ratio(200, 300), "2:3");
    assert_eq!(p.nearest_aspect_ratio(90, 400), "9:16");
    assert_eq!(p.nearest_aspect_ratio(10, 0), "1:1");
}

#[test]
fn ratio_table_is_replaceable() {
    let p = GenerationPresets {
        aspect_ratios: vec![("wide".to_owned(), 2.0), ("tall".to_owned(), 0.5)],
        ..GenerationPresets::default()
    };
    assert_eq!(p.nearest_aspect_ratio(300, 100), "wide");
    assert_eq!(p.nearest_aspect_ratio(100, 300), "tall");
}

#[test]
fn unknown_constraint_preset_lists_known_names() {
    let p = GenerationPresets::default();
    assert!(p.constraint("walk_horizontal").unwrap().contains("baseline"));
    let err = p.constraint("fly").unwrap_err().to_string();
    assert!(err.contains("walk_horizontal"), "{err}");
}
