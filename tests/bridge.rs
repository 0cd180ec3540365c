//! Drive the JSON-lines bridge the way a host application would.

use image::{Rgb, RgbImage};
use image_crop::bridge::serve;
use image_crop::config::EngineConfig;
use image_crop::engine::Engine;
use serde_json::{Value, json};
use std::path::Path;
use tempfile::TempDir;

fn engine(scratch: &Path) -> Engine {
    let mut config = EngineConfig::default();
    config.scratch_dir = Some(scratch.to_path_buf());
    config.processing.max_processes = Some(2);
    Engine::from_config(&config).unwrap()
}

fn call(id: u64, method: &str, arguments: Value) -> String {
    json!({"id": id, "request": {"method": method, "arguments": arguments}}).to_string()
}

fn exchange(engine: &Engine, lines: &[String]) -> Vec<Value> {
    let input = lines.join("\n");
    let mut output = Vec::new();
    serve(engine, input.as_bytes(), &mut output).unwrap();
    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn answer(responses: &[Value], id: u64) -> &Value {
    responses
        .iter()
        .find(|r| r["id"] == id)
        .unwrap_or_else(|| panic!("no response for {id}"))
}

#[test]
fn full_session() {
    let tmp = TempDir::new().unwrap();
    let scratch = tmp.path().join("scratch");
    let source = tmp.path().join("photo.jpg");
    RgbImage::from_pixel(600, 400, Rgb([90, 140, 200]))
        .save(&source)
        .unwrap();
    let path = source.to_string_lossy().to_string();

    let engine = engine(&scratch);
    let responses = exchange(
        &engine,
        &[
            // Creates the scratch directory before anything writes there.
            call(1, "requestPermissions", Value::Null),
            call(2, "getImageOptions", json!({"path": path})),
        ],
    );
    assert_eq!(answer(&responses, 1)["result"], json!(true));
    assert_eq!(
        answer(&responses, 2)["result"],
        json!({"width": 600, "height": 400})
    );

    let responses = exchange(
        &engine,
        &[
            call(
                3,
                "cropImage",
                json!({"path": path, "scale": 0.5, "left": 0.0, "top": 0.0, "right": 1.0, "bottom": 1.0}),
            ),
            call(
                4,
                "sampleImage",
                json!({"path": path, "maximumWidth": 150, "maximumHeight": 150}),
            ),
            call(5, "getImageOptions", json!({"path": tmp.path().join("none.jpg")})),
            call(6, "flipImage", json!({})),
        ],
    );
    assert_eq!(responses.len(), 4);

    let cropped = answer(&responses, 3)["result"].as_str().unwrap();
    assert!(Path::new(cropped).starts_with(&scratch));
    assert_eq!(image::image_dimensions(cropped).unwrap(), (300, 200));

    let sampled = answer(&responses, 4)["result"].as_str().unwrap();
    assert_eq!(image::image_dimensions(sampled).unwrap(), (225, 150));

    assert_eq!(
        answer(&responses, 5)["error"],
        json!({"code": "INVALID", "message": "Image source cannot be opened"})
    );
    assert_eq!(answer(&responses, 6)["error"]["code"], "NOT_IMPLEMENTED");
    assert_eq!(engine.live_rasters(), 0);
}

#[test]
fn undecodable_source_message() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("broken.jpg");
    std::fs::write(&source, b"GIF89a? no").unwrap();

    let engine = engine(tmp.path());
    let responses = exchange(
        &engine,
        &[call(1, "sampleImage", json!({"path": source, "maximumWidth": 10, "maximumHeight": 10}))],
    );
    assert_eq!(
        responses[0]["error"]["message"],
        "Image source cannot be decoded"
    );
}

#[test]
fn invalid_region_is_rejected_with_reason() {
    let tmp = TempDir::new().unwrap();
    let engine = engine(tmp.path());
    let responses = exchange(
        &engine,
        &[call(
            1,
            "cropImage",
            json!({"path": "/any.jpg", "scale": 1.0, "left": 0.9, "top": 0.0, "right": 0.1, "bottom": 1.0}),
        )],
    );
    assert_eq!(responses[0]["error"]["code"], "INVALID");
    assert!(
        responses[0]["error"]["message"]
            .as_str()
            .unwrap()
            .contains("Invalid crop region")
    );
}

#[test]
fn oversized_crop_is_rejected_and_session_continues() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("tiny.jpg");
    RgbImage::from_pixel(10, 10, Rgb([0, 0, 0])).save(&source).unwrap();

    let engine = engine(tmp.path());
    let responses = exchange(
        &engine,
        &[
            call(
                1,
                "cropImage",
                json!({"path": source, "scale": 1e12, "left": 0.0, "top": 0.0, "right": 1.0, "bottom": 1.0}),
            ),
            call(2, "getImageOptions", json!({"path": source})),
        ],
    );
    assert_eq!(answer(&responses, 1)["error"]["code"], "INVALID");
    assert_eq!(
        answer(&responses, 2)["result"],
        json!({"width": 10, "height": 10})
    );
}
