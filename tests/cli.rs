use assert_cmd::prelude::*;
use predicates::str::contains;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const OBJECT_TEXTURE: &str = "resources/textures/NeonPinkPlastic.jpg";
const PLANE_TEXTURE: &str = "resources/textures/granite.jpg";

fn workspace() -> TempDir {
    let dir = tempfile::tempdir().expect("temp dir");
    fs::create_dir_all(dir.path().join("resources/textures")).expect("texture dir");
    dir
}

fn write_rgb(path: &Path, width: u32, height: u32) {
    let image = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 16) as u8, (y * 16) as u8, 128])
    });
    image.save(path).expect("write rgb texture");
}

fn write_gray(path: &Path) {
    let image = image::GrayImage::from_fn(8, 8, |x, y| image::Luma([((x + y) * 8) as u8]));
    image.save(path).expect("write gray texture");
}

fn viewer(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("scene-viewer").expect("binary exists");
    cmd.current_dir(dir.path());
    cmd
}

#[test]
fn missing_textures_fail_startup() {
    let dir = workspace();
    viewer(&dir)
        .args(["--headless", "1"])
        .assert()
        .failure()
        .stderr(contains("failed to load texture"))
        .stderr(contains("NeonPinkPlastic.jpg"));
}

#[test]
fn single_channel_texture_is_rejected() {
    let dir = workspace();
    write_gray(&dir.path().join(OBJECT_TEXTURE));
    write_rgb(&dir.path().join(PLANE_TEXTURE), 16, 16);
    viewer(&dir)
        .args(["--headless", "1"])
        .assert()
        .failure()
        .stderr(contains("unsupported channel layout"))
        .stderr(contains("1 channel(s)"));
}

#[test]
fn headless_run_renders_requested_frames() {
    let dir = workspace();
    write_rgb(&dir.path().join(OBJECT_TEXTURE), 16, 8);
    write_rgb(&dir.path().join(PLANE_TEXTURE), 32, 32);
    viewer(&dir)
        .args(["--headless", "3"])
        .assert()
        .success()
        .stdout(contains("Loaded scene with 126 vertices and 3 programs"))
        .stdout(contains("Rendered 3 headless frame(s), 9 draw call(s)"))
        .stdout(contains("uv scale=(5.00, 5.00) wrap=REPEAT projection=perspective"));
}

#[test]
fn unknown_flags_are_rejected() {
    let dir = workspace();
    viewer(&dir)
        .arg("--fullscreen")
        .assert()
        .failure()
        .stderr(contains("Unknown argument: --fullscreen"));
}

#[test]
fn headless_requires_a_frame_count() {
    let dir = workspace();
    viewer(&dir)
        .args(["--headless", "many"])
        .assert()
        .failure()
        .stderr(contains("invalid frame count"));
}
