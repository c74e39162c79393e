//! Size-constrained encoder tests.
//!
//! Tests verify:
//! - The fast path returns the default grayscale encoding untouched
//! - The chosen quality is the highest one that fits
//! - JPEG size grows with quality (within a small tolerance)
//! - Downscaling follows the ×0.9 chain and stops at the first fit
//! - Budgets below anything achievable at 10 px report failure

use image::DynamicImage;
use proptest::prelude::*;

use shrinkwatch::format::ImageKind;
use shrinkwatch::shrink::{
    to_grayscale, FitOutcome, FitStrategy, Fitted, GrayCodec, SizeBudget, SizeConstrainedEncoder,
    MAX_QUALITY, MIN_DIMENSION,
};

use super::test_utils::{fallback_chain, is_valid_jpeg, textured_gray, textured_rgb};

fn fit(img: DynamicImage, kind: ImageKind, limit: u64) -> FitOutcome {
    SizeConstrainedEncoder::new(SizeBudget::new(limit).unwrap())
        .fit(img, kind)
        .unwrap()
}

fn expect_fitted(outcome: FitOutcome) -> Fitted {
    match outcome {
        FitOutcome::Fitted(fitted) => fitted,
        other => panic!("Expected a fit, got {:?}", other),
    }
}

// =============================================================================
// Fast Path
// =============================================================================

#[test]
fn test_under_budget_returns_default_encoding() {
    for kind in [ImageKind::Jpeg, ImageKind::Png, ImageKind::Bmp, ImageKind::Gif] {
        let img = DynamicImage::ImageRgb8(textured_rgb(60, 40, 7));
        let expected = GrayCodec::new(kind)
            .encode_default(&to_grayscale(img.clone()))
            .unwrap();

        let fitted = expect_fitted(fit(img, kind, 10 * 1024 * 1024));

        assert_eq!(fitted.strategy, FitStrategy::Default, "{}", kind);
        assert_eq!(fitted.bytes.as_ref(), expected.as_slice(), "{}", kind);
        assert!(fitted.size() <= 10 * 1024 * 1024);
    }
}

#[test]
fn test_exact_budget_fits() {
    let gray = textured_gray(64, 64, 3);
    let exact = GrayCodec::new(ImageKind::Jpeg)
        .encode_default(&gray)
        .unwrap()
        .len() as u64;

    let fitted = expect_fitted(fit(DynamicImage::ImageLuma8(gray), ImageKind::Jpeg, exact));
    assert_eq!(fitted.strategy, FitStrategy::Default);
    assert_eq!(fitted.size(), exact);
}

// =============================================================================
// Quality Search
// =============================================================================

#[test]
fn test_returns_highest_fitting_quality() {
    let gray = textured_gray(160, 120, 11);
    let codec = GrayCodec::new(ImageKind::Jpeg);

    for target in [5u8, 20, 45, 70] {
        let limit = codec.encode(&gray, target).unwrap().len() as u64;
        let fitted = expect_fitted(fit(
            DynamicImage::ImageLuma8(gray.clone()),
            ImageKind::Jpeg,
            limit,
        ));

        assert_eq!(fitted.strategy, FitStrategy::QualitySearch, "target {}", target);
        assert_eq!((fitted.width, fitted.height), (160, 120));
        assert!(fitted.size() <= limit);
        assert!(is_valid_jpeg(&fitted.bytes));

        let quality = fitted.quality.unwrap();
        assert!(quality >= 1 && quality <= MAX_QUALITY);
        if quality < MAX_QUALITY {
            let above = codec.encode(&gray, quality + 1).unwrap().len() as u64;
            assert!(
                above > limit,
                "quality {} also fits ({} <= {})",
                quality + 1,
                above,
                limit
            );
        }
    }
}

#[test]
fn test_budget_above_default_takes_fast_path() {
    let gray = textured_gray(160, 120, 11);
    let limit = GrayCodec::new(ImageKind::Jpeg)
        .encode(&gray, 90)
        .unwrap()
        .len() as u64;

    let fitted = expect_fitted(fit(DynamicImage::ImageLuma8(gray), ImageKind::Jpeg, limit));
    assert_eq!(fitted.strategy, FitStrategy::Default);
    assert_eq!(fitted.quality, None);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_jpeg_size_non_decreasing_in_quality(
        seed in any::<u32>(),
        q1 in 1u8..=95,
        q2 in 1u8..=95,
    ) {
        let (low, high) = (q1.min(q2), q1.max(q2));
        let gray = textured_gray(48, 48, seed);
        let codec = GrayCodec::new(ImageKind::Jpeg);

        let low_size = codec.encode(&gray, low).unwrap().len();
        let high_size = codec.encode(&gray, high).unwrap().len();
        let tolerance = (high_size / 20).max(64);

        prop_assert!(
            low_size <= high_size + tolerance,
            "quality {} gave {} bytes, quality {} gave {} bytes",
            low, low_size, high, high_size
        );
    }
}

// =============================================================================
// Resolution Fallback
// =============================================================================

#[test]
fn test_large_color_jpeg_is_downscaled() {
    let img = DynamicImage::ImageRgb8(textured_rgb(640, 480, 42));
    let codec = GrayCodec::new(ImageKind::Jpeg);
    let floor = codec.encode(&to_grayscale(img.clone()), 1).unwrap().len() as u64;
    let limit = floor * 7 / 10;

    let fitted = expect_fitted(fit(img, ImageKind::Jpeg, limit));

    let levels = match fitted.strategy {
        FitStrategy::Downscaled { levels } => levels,
        other => panic!("Expected Downscaled, got {:?}", other),
    };
    let chain = fallback_chain(640, 480);
    assert_eq!(chain[levels as usize - 1], (fitted.width, fitted.height));
    assert!(fitted.size() <= limit);

    let decoded = image::load_from_memory(&fitted.bytes).unwrap();
    assert!(matches!(decoded, DynamicImage::ImageLuma8(_)));
    assert_eq!((decoded.width(), decoded.height()), (fitted.width, fitted.height));
}

#[test]
fn test_fallback_chain_matches_rounding_down() {
    let chain = fallback_chain(4000, 3000);
    assert_eq!(chain[0], (3600, 2700));
    assert_eq!(chain[1], (3240, 2430));
    assert_eq!(chain[2], (2916, 2187));

    let last = *chain.last().unwrap();
    assert!(last.0 >= MIN_DIMENSION && last.1 >= MIN_DIMENSION);
    assert!(last.1 * 9 / 10 < MIN_DIMENSION);
}

#[test]
fn test_impossible_budget_reports_failure() {
    for kind in [ImageKind::Jpeg, ImageKind::Png, ImageKind::Bmp, ImageKind::Gif] {
        let img = DynamicImage::ImageRgb8(textured_rgb(80, 60, 5));

        match fit(img, kind, 16) {
            FitOutcome::Unsatisfiable { width, height, .. } => {
                assert!(width >= MIN_DIMENSION && height >= MIN_DIMENSION);
                assert_eq!(fallback_chain(80, 60).last(), Some(&(width, height)));
            }
            other => panic!("{}: expected Unsatisfiable, got {:?}", kind, other),
        }
    }
}
