//! Per-file pipeline tests.
//!
//! Tests verify:
//! - Files are rewritten in place, same name and format, grayscale
//! - Files already under budget are rewritten at the default encoding
//! - Repeated passes reach a fixed point without further downscaling
//! - Decode and budget failures leave the original byte-for-byte intact

use std::fs;

use image::DynamicImage;
use tempfile::TempDir;

use shrinkwatch::format::ImageKind;
use shrinkwatch::pipeline::{ImageProcessor, ProcessOutcome, TEMP_FILE_PREFIX};
use shrinkwatch::shrink::{FitStrategy, GrayCodec, SizeBudget};
use shrinkwatch::ProcessError;

use super::test_utils::{
    fallback_chain, file_size, is_valid_jpeg, rgb_jpeg, textured_gray, textured_rgb,
};

fn processor(bytes: u64) -> ImageProcessor {
    ImageProcessor::new(SizeBudget::new(bytes).unwrap())
}

#[test]
fn test_jpeg_rewritten_in_place() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("IMG_0001.JPG");
    let source = rgb_jpeg(&textured_rgb(320, 240, 1), 95);
    fs::write(&path, &source).unwrap();
    let limit = source.len() as u64 / 4;

    let outcome = processor(limit).process_file(&path).unwrap();
    let replacement = match outcome {
        ProcessOutcome::Replaced(replacement) => replacement,
        other => panic!("Expected Replaced, got {:?}", other),
    };

    assert!(replacement.converted);
    assert_eq!(replacement.original_size, source.len() as u64);
    assert_eq!(
        (replacement.original_width, replacement.original_height),
        (320, 240)
    );

    let written = fs::read(&path).unwrap();
    assert!(written.len() as u64 <= limit);
    assert!(is_valid_jpeg(&written));

    let decoded = image::load_from_memory(&written).unwrap();
    assert!(matches!(decoded, DynamicImage::ImageLuma8(_)));
    match replacement.fitted.strategy {
        FitStrategy::Downscaled { .. } => {
            assert!(fallback_chain(320, 240).contains(&(decoded.width(), decoded.height())));
        }
        _ => assert_eq!((decoded.width(), decoded.height()), (320, 240)),
    }

    // Only the replaced file remains; no temporaries
    let names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["IMG_0001.JPG".to_string()]);
    assert!(!names[0].starts_with(TEMP_FILE_PREFIX));
}

#[test]
fn test_reprocessing_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("photo.png");
    textured_rgb(120, 90, 2).save(&path).unwrap();
    let limit = file_size(&path) / 3;

    let processor = processor(limit);
    let first = match processor.process_file(&path).unwrap() {
        ProcessOutcome::Replaced(replacement) => replacement,
        other => panic!("Expected Replaced, got {:?}", other),
    };
    let dimensions = (first.fitted.width, first.fitted.height);

    // A processed file goes straight through the fast path or the search at
    // its current size: never downscaled again, never over the limit.
    processor.process_file(&path).unwrap();
    let second = fs::read(&path).unwrap();
    let decoded = image::load_from_memory(&second).unwrap();
    assert_eq!((decoded.width(), decoded.height()), dimensions);
    assert!(second.len() as u64 <= limit);

    let third = processor.process_file(&path).unwrap();
    assert!(matches!(third, ProcessOutcome::AlreadyCompliant { size } if size == second.len() as u64));
    assert_eq!(fs::read(&path).unwrap(), second);
}

#[test]
fn test_gray_file_under_budget_gets_default_encoding() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("scan.jpg");
    let gray = textured_gray(96, 64, 8);
    let source = GrayCodec::new(ImageKind::Jpeg).encode(&gray, 95).unwrap();
    fs::write(&path, &source).unwrap();

    let decoded = image::load_from_memory(&source).unwrap().to_luma8();
    let expected = GrayCodec::new(ImageKind::Jpeg)
        .encode_default(&decoded)
        .unwrap();

    let outcome = processor(1024 * 1024).process_file(&path).unwrap();

    assert!(matches!(
        outcome,
        ProcessOutcome::Replaced(ref r) if r.fitted.strategy == FitStrategy::Default && !r.converted
    ));
    assert_eq!(fs::read(&path).unwrap(), expected);
}

#[test]
fn test_extension_mismatch_keeps_real_format() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("actually_png.jpg");
    let mut png = Vec::new();
    DynamicImage::ImageRgb8(textured_rgb(50, 50, 3))
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();
    fs::write(&path, &png).unwrap();

    processor(1024 * 1024).process_file(&path).unwrap();

    let written = fs::read(&path).unwrap();
    assert_eq!(
        image::guess_format(&written).unwrap(),
        image::ImageFormat::Png
    );
}

#[test]
fn test_unsatisfiable_file_unchanged() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("big.gif");
    textured_rgb(64, 64, 4).save(&path).unwrap();
    let before = fs::read(&path).unwrap();

    let err = processor(8).process_file(&path).unwrap_err();

    assert!(matches!(err, ProcessError::Unsatisfiable { budget: 8, .. }));
    assert!(err.is_expected());
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn test_empty_file_is_decode_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.bmp");
    fs::write(&path, b"").unwrap();

    let err = processor(1024).process_file(&path).unwrap_err();
    assert!(matches!(err, ProcessError::Decode { .. }));
    assert_eq!(file_size(&path), 0);
}
