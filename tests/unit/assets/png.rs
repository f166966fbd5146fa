use std::path::PathBuf;

use image::Rgba;

use super::*;

fn scratch(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join("unit_scratch").join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn tiny(color: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(3, 2, Rgba(color))
}

#[test]
fn atomic_write_round_trips_and_leaves_no_temp() {
    let dir = scratch("png_atomic_ok");
    let dest = dir.join("walk_00.png");
    write_png_atomic(&tiny([1, 2, 3, 255]), &dest).unwrap();

    assert_eq!(load_rgba(&dest).unwrap(), tiny([1, 2, 3, 255]));
    assert!(!dir.join(".walk_00.png.tmp.png").exists());
}

#[test]
fn interrupted_write_leaves_destination_untouched() {
    let dir = scratch("png_atomic_interrupted");
    let dest = dir.join("walk_00.png");
    write_png_atomic(&tiny([9, 9, 9, 255]), &dest).unwrap();

    let staged = stage_png(&tiny([200, 0, 0, 255]), &dest).unwrap();
    let tmp = staged.temp_path().unwrap().to_path_buf();
    assert!(tmp.exists());
    // The old file is still fully intact while the new one sits in the temp file.
    assert_eq!(load_rgba(&dest).unwrap(), tiny([9, 9, 9, 255]));

    drop(staged);
    assert!(!tmp.exists());
    assert_eq!(load_rgba(&dest).unwrap(), tiny([9, 9, 9, 255]));
}

#[test]
fn interrupted_first_write_leaves_no_destination() {
    let dir = scratch("png_atomic_absent");
    let dest = dir.join("idle.png");
    let staged = stage_png(&tiny([1, 1, 1, 255]), &dest).unwrap();
    assert!(!dest.exists());
    drop(staged);
    assert!(!dest.exists());
}

#[test]
fn commit_replaces_existing_destination() {
    let dir = scratch("png_atomic_replace");
    let dest = dir.join("walk_01.png");
    write_png_atomic(&tiny([9, 9, 9, 255]), &dest).unwrap();
    stage_png(&tiny([7, 7, 7, 255]), &dest)
        .unwrap()
        .commit()
        .unwrap();
    assert_eq!(load_rgba(&dest).unwrap(), tiny([7, 7, 7, 255]));
}

#[test]
fn temp_sibling_is_hidden_next_to_destination() {
    let p = temp_sibling(std::path::Path::new("a/b/run_03.png"), ".png").unwrap();
    assert_eq!(p, PathBuf::from("a/b/.run_03.png.tmp.png"));
}

#[test]
fn load_missing_image_is_a_precondition_error() {
    let err = load_rgba(std::path::Path::new("target/definitely/missing.png")).unwrap_err();
    assert!(matches!(err, ReskinError::Precondition(_)));
}
