use super::*;

#[test]
fn index_spec_mixes_values_and_ranges() {
    assert_eq!(parse_index_spec("2,4-6,8").unwrap(), vec![2, 4, 5, 6, 8]);
}

#[test]
fn index_spec_ranges_may_descend() {
    assert_eq!(parse_index_spec("6-4").unwrap(), vec![6, 5, 4]);
    assert_eq!(parse_index_spec("3-3").unwrap(), vec![3]);
}

#[test]
fn index_spec_tolerates_whitespace_and_empty_parts() {
    assert_eq!(parse_index_spec(" 1 , ,2 - 3,").unwrap(), vec![1, 2, 3]);
    assert!(parse_index_spec("").unwrap().is_empty());
}

#[test]
fn index_spec_rejects_garbage() {
    assert!(parse_index_spec("1,x").is_err());
    assert!(parse_index_spec("1-").is_err());
    assert!(parse_index_spec("-2").is_err());
}

#[test]
fn frame_label_uses_first_digit_run() {
    assert_eq!(frame_label(Path::new("frames/frame_012.png")), Some(12));
    assert_eq!(frame_label(Path::new("take2_frame_7.png")), Some(2));
    assert_eq!(frame_label(Path::new("cover.png")), Some(0));
}

#[test]
fn oversized_labels_do_not_collide_with_zero() {
    assert_eq!(
        frame_label(Path::new("frame_4294967296.png")),
        Some(4_294_967_296)
    );
    assert_eq!(frame_label(Path::new("frame_99999999999999999999999.png")), None);

    let candidates = vec![
        PathBuf::from("frame_000.png"),
        PathBuf::from("frame_4294967296.png"),
        PathBuf::from("frame_99999999999999999999999.png"),
    ];
    assert_eq!(
        select_frames(&candidates, &[0]).unwrap(),
        vec![PathBuf::from("frame_000.png")]
    );
}

#[test]
fn list_frames_skips_unparseable_labels() {
    let dir = PathBuf::from("target")
        .join("unit_scratch")
        .join("select_oversized_label");
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    for name in ["frame_002.png", "frame_001.png", "frame_99999999999999999999999.png"] {
        std::fs::write(dir.join(name), b"x").unwrap();
    }
    assert_eq!(
        list_frames(&dir).unwrap(),
        vec![dir.join("frame_001.png"), dir.join("frame_002.png")]
    );
}

#[test]
fn select_frames_follows_request_order() {
    let candidates: Vec<PathBuf> = (1..=5)
        .map(|i| PathBuf::from(format!("frame_{i:03}.png")))
        .collect();
    let picked = select_frames(&candidates, &[4, 2, 2]).unwrap();
    assert_eq!(
        picked,
        vec![
            PathBuf::from("frame_004.png"),
            PathBuf::from("frame_002.png"),
            PathBuf::from("frame_002.png"),
        ]
    );
}

#[test]
fn select_frames_names_missing_label() {
    let candidates = vec![PathBuf::from("frame_001.png")];
    let err = select_frames(&candidates, &[1, 9]).unwrap_err().to_string();
    assert!(err.contains("frame label not found: 9"), "{err}");
}

#[test]
fn sequential_names_are_zero_padded_from_start() {
    let naming = OutputNaming::Sequential { start: 0, width: 2 };
    assert_eq!(
        naming.names("walk_", 3).unwrap(),
        vec!["walk_00.png", "walk_01.png", "walk_02.png"]
    );
    let naming = OutputNaming::Sequential { start: 8, width: 3 };
    assert_eq!(naming.names("run", 2).unwrap(), vec!["run008.png", "run009.png"]);
}

#[test]
fn explicit_names_require_matching_count() {
    let naming = OutputNaming::Explicit {
        indices: vec![0, 1, 2, 4],
        width: 2,
    };
    assert_eq!(
        naming.names("walk_", 4).unwrap(),
        vec!["walk_00.png", "walk_01.png", "walk_02.png", "walk_04.png"]
    );
    let err = naming.names("walk_", 3).unwrap_err().to_string();
    assert!(err.contains("(4 != 3)"), "{err}");
}

#[test]
fn single_naming_requires_one_frame() {
    assert_eq!(
        OutputNaming::Single.names("idle", 1).unwrap(),
        vec!["idle.png"]
    );
    assert!(OutputNaming::Single.names("idle", 2).is_err());
}
