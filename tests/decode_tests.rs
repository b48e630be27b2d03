//! End-to-end decode tests on rendered symbols
//!
//! These run the default engines (no native detector, rqrr software decoder)
//! through the full pass cascade.

mod common;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use common::{PAYLOAD, inverted_symbol, noise, opaque_symbol, png_bytes, side, transparent_symbol};
use qr_cascade::engines::Candidate;
use qr_cascade::engines::native::{NativeCapabilities, NativeDetector};
use qr_cascade::{
    BarcodeFormat, DecodeOptions, DecodeOrchestrator, EngineError, EngineKind, ImageInput,
    NativeEngine, PixelBuffer, RqrrDecoder, SoftwareEngine,
};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

#[test]
fn test_decode_first_opaque_symbol() {
    let options = DecodeOptions::default();
    let result = qr_cascade::decode_from_buffer_blocking(&opaque_symbol(), &options)
        .expect("symbol should decode");
    assert_eq!(result.text, PAYLOAD);
    assert_eq!(result.format, BarcodeFormat::QrCode);
    assert_eq!(result.meta.engine, EngineKind::Software);
    assert_eq!(result.meta.pass_name.as_deref(), Some("luma"));
    assert_eq!(result.meta.inverted_flag, Some(false));

    let points = result.points.expect("software engine reports corners");
    assert_eq!(points.len(), 4);
    let limit = side() as f32;
    assert!(points.iter().all(|p| p.x >= 0.0 && p.y >= 0.0 && p.x <= limit && p.y <= limit));
}

#[test]
fn test_decode_first_transparent_symbol() {
    let options = DecodeOptions::default();
    let result = qr_cascade::decode_from_buffer_blocking(&transparent_symbol(), &options)
        .expect("flattened symbol should decode");
    assert_eq!(result.text, PAYLOAD);
    let pass = result.meta.pass_name.as_deref().unwrap();
    assert!(pass.starts_with("flatten-black"), "decoded on {pass}");
    assert_eq!(result.meta.inverted_flag, Some(true));
}

#[test]
fn test_decode_first_inverted_symbol() {
    let options = DecodeOptions::default();
    let result = qr_cascade::decode_from_buffer_blocking(&inverted_symbol(), &options)
        .expect("inverted symbol should decode");
    assert_eq!(result.text, PAYLOAD);
    assert_eq!(result.meta.inverted_flag, Some(true));
}

#[test]
fn test_inverted_symbol_needs_invert_passes() {
    let options = DecodeOptions::default().try_invert(false).max_passes(1);
    assert!(qr_cascade::decode_from_buffer_blocking(&inverted_symbol(), &options).is_none());
}

#[test]
fn test_noise_yields_nothing() {
    let options = DecodeOptions::default().aggressive(true);
    for seed in [1, 7, 42] {
        let image = noise(64, 64, seed);
        assert!(qr_cascade::decode_from_buffer_blocking(&image, &options).is_none());
        assert!(qr_cascade::decode_all_from_buffer_blocking(&image, &options).is_empty());
    }
}

#[test]
fn test_decode_all_reports_symbol_once() {
    let options = DecodeOptions::default().aggressive(true);
    let results = qr_cascade::decode_all_from_buffer_blocking(&opaque_symbol(), &options);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].text, PAYLOAD);
    assert_eq!(results[0].meta.pass_name.as_deref(), Some("luma"));
}

#[test]
fn test_async_api() {
    let image = opaque_symbol();
    let options = DecodeOptions::default();
    let first = tokio_test::block_on(qr_cascade::decode_from_buffer(&image, &options));
    assert_eq!(first.map(|r| r.text).as_deref(), Some(PAYLOAD));

    let input = ImageInput::Bytes(png_bytes(&image));
    let all = tokio_test::block_on(qr_cascade::decode_all(&input, &options)).unwrap();
    assert_eq!(all.len(), 1);
}

#[test]
fn test_decode_encoded_inputs_with_and_without_worker() {
    let png = png_bytes(&opaque_symbol());
    for worker in [true, false] {
        let options = DecodeOptions::default().worker(worker);
        let result = qr_cascade::decode_blocking(&ImageInput::Bytes(png.clone()), &options)
            .unwrap()
            .unwrap();
        assert_eq!(result.text, PAYLOAD);

        let data_url = format!("data:image/png;base64,{}", STANDARD.encode(&png));
        let result = qr_cascade::decode_blocking(&ImageInput::Base64(data_url), &options)
            .unwrap()
            .unwrap();
        assert_eq!(result.text, PAYLOAD);
    }
}

#[test]
fn test_downscaled_input_still_decodes() {
    let png = png_bytes(&opaque_symbol());
    let options = DecodeOptions::default().downscale_max_dim(100).worker(false);
    let result = qr_cascade::decode_blocking(&ImageInput::Bytes(png), &options).unwrap();
    assert_eq!(result.map(|r| r.text).as_deref(), Some(PAYLOAD));
}

#[test]
fn test_result_json_contract() {
    let options = DecodeOptions::default();
    let result = qr_cascade::decode_from_buffer_blocking(&opaque_symbol(), &options).unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["format"], "QR_CODE");
    assert_eq!(json["meta"]["engine"], "software");
    assert_eq!(json["meta"]["passName"], "luma");
    assert_eq!(json["meta"]["invertedFlag"], false);
    assert_eq!(json["points"].as_array().unwrap().len(), 4);
}

/// Native detector that always reports the payload and counts its probes
#[derive(Default)]
struct EchoDetector {
    probes: AtomicUsize,
}

impl NativeDetector for EchoDetector {
    async fn probe(&self) -> Result<NativeCapabilities, EngineError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        Ok(NativeCapabilities { qr_code: true })
    }

    async fn detect(&self, _buffer: &PixelBuffer) -> Result<Vec<Candidate>, EngineError> {
        Ok(vec![Candidate::new(PAYLOAD)])
    }
}

/// Native detector whose probe succeeds but every detect fails
struct BrokenDetector;

impl NativeDetector for BrokenDetector {
    async fn probe(&self) -> Result<NativeCapabilities, EngineError> {
        Ok(NativeCapabilities { qr_code: true })
    }

    async fn detect(&self, _buffer: &PixelBuffer) -> Result<Vec<Candidate>, EngineError> {
        Err(EngineError::Failed("platform detector crashed".into()))
    }
}

#[test]
fn test_native_and_software_agree_once() {
    let orchestrator = DecodeOrchestrator::new(
        NativeEngine::new(EchoDetector::default()),
        SoftwareEngine::new(RqrrDecoder),
    );
    let options = DecodeOptions::default().aggressive(true);
    let results = orchestrator.decode_all_blocking(&opaque_symbol(), &options);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].meta.engine, EngineKind::Native);
    assert_eq!(results[0].meta.pass_name, None);

    let first = orchestrator.decode_first_blocking(&opaque_symbol(), &options).unwrap();
    assert_eq!(first.meta.engine, EngineKind::Native);
    assert_eq!(orchestrator.native().detector().probes.load(Ordering::SeqCst), 1);
}

#[test]
fn test_broken_native_engine_falls_through_to_software() {
    let orchestrator = DecodeOrchestrator::new(
        NativeEngine::new(BrokenDetector),
        SoftwareEngine::new(RqrrDecoder),
    );
    let result = orchestrator
        .decode_first_blocking(&opaque_symbol(), &DecodeOptions::default())
        .unwrap();
    assert_eq!(result.text, PAYLOAD);
    assert_eq!(result.meta.engine, EngineKind::Software);
}

#[test]
fn test_decode_dataset_image_if_present() {
    let img_path = Path::new("benches/images/boofcv/monitor/image001.jpg");
    if !img_path.exists() {
        eprintln!("Skipping test: {} not found", img_path.display());
        return;
    }
    let options = DecodeOptions::default().aggressive(true);
    let results = qr_cascade::decode_all_blocking(&ImageInput::path(img_path), &options)
        .expect("dataset image should load");
    // regression guard: whatever decodes must be well formed
    for r in &results {
        assert!(!r.text.is_empty());
        assert_eq!(r.format, BarcodeFormat::QrCode);
    }
}
