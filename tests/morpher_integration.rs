//! Integration tests for the morpher facade loading parameters from disk

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use approx::assert_abs_diff_eq;
use morpher::decoder::sigmoid;
use morpher::{Error, FileSource, LoadStatus, Morpher, MorpherConfig, ParameterSource};
use tempfile::TempDir;
use tokio::sync::Semaphore;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn to_bytes(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn write_asset(dir: &Path, name: &str, bytes: &[u8]) {
    std::fs::write(dir.join(name), bytes).expect("fixture write should succeed");
}

/// One layer, latent width 2, a single pixel: W = [[1, 1]], b = [0]
fn write_single_pixel_model(dir: &Path) {
    write_asset(dir, "sizes.csv", b"1,2\n");
    write_asset(dir, "d_W_0.bin", &to_bytes(&[1.0, 1.0]));
    write_asset(dir, "d_b_0.bin", &to_bytes(&[0.0]));
}

fn single_pixel_config() -> MorpherConfig {
    MorpherConfig::default()
        .with_latent(2, vec![0, 1])
        .with_image_side(1)
        .with_default_dimensions(0, 1)
}

/// Three layers, all zero: 9 pixels ← 5 ← 5 ← 4 latent
fn write_zero_model(dir: &Path) {
    write_asset(dir, "sizes.csv", b"9,5,5,4");
    write_asset(dir, "d_W_0.bin", &to_bytes(&[0.0; 45]));
    write_asset(dir, "d_b_0.bin", &to_bytes(&[0.0; 9]));
    write_asset(dir, "d_W_1.bin", &to_bytes(&[0.0; 25]));
    write_asset(dir, "d_b_1.bin", &to_bytes(&[0.0; 5]));
    write_asset(dir, "d_W_2.bin", &to_bytes(&[0.0; 20]));
    write_asset(dir, "d_b_2.bin", &to_bytes(&[0.0; 5]));
}

fn zero_model_config() -> MorpherConfig {
    MorpherConfig::default()
        .with_latent(4, vec![3, 1, 0])
        .with_image_side(3)
        .with_default_dimensions(0, 2)
}

/// Wraps a source and holds every blob fetch until a permit is released.
struct GatedSource<S> {
    inner: S,
    gate: Arc<Semaphore>,
}

impl<S: ParameterSource> ParameterSource for GatedSource<S> {
    async fn fetch(&self, name: &str) -> morpher::Result<Vec<u8>> {
        if name.ends_with(".bin") {
            let permit = self.gate.acquire().await.map_err(|e| Error::load(name, e.to_string()))?;
            permit.forget();
        }
        self.inner.fetch(name).await
    }
}

#[tokio::test]
async fn test_single_layer_face_from_disk() {
    let dir = TempDir::new().expect("temp dir creation should succeed");
    write_single_pixel_model(dir.path());

    let morpher = Morpher::load(FileSource::new(dir.path()), single_pixel_config())
        .await
        .expect("fixture model should load");
    morpher.set_latent(vec![1.0, 1.0]).expect("width 2");

    let face = morpher.generate_face().expect("ready");
    assert_eq!(face.side(), 1);
    assert_abs_diff_eq!(face.as_slice()[0], 0.8808, epsilon = 1e-4);
}

#[tokio::test]
async fn test_zero_network_is_uniform_gray() {
    let dir = TempDir::new().expect("temp dir creation should succeed");
    write_zero_model(dir.path());

    let morpher =
        Morpher::load(FileSource::new(dir.path()), zero_model_config()).await.expect("load");
    assert_eq!(morpher.expected_count(), Some(6));

    let face = morpher.generate_face().expect("ready");
    assert_eq!(face.side(), 3);
    assert!(face.as_slice().iter().all(|p| *p == 0.5));
    assert_eq!(face.to_grayscale_bytes(), vec![127u8; 9]);
}

#[tokio::test]
async fn test_generate_face_is_deterministic() {
    let dir = TempDir::new().expect("temp dir creation should succeed");
    write_asset(dir.path(), "sizes.csv", b"4,3,2");
    write_asset(
        dir.path(),
        "d_W_0.bin",
        &to_bytes(&[0.3, -0.2, 0.1, 0.7, -0.5, 0.4, 0.2, 0.9, -0.1, 0.6, 0.8, -0.3]),
    );
    write_asset(dir.path(), "d_b_0.bin", &to_bytes(&[0.1, -0.1, 0.05, 0.0]));
    write_asset(dir.path(), "d_W_1.bin", &to_bytes(&[0.5, -0.4, 0.3, 0.2, -0.6, 0.9]));
    write_asset(dir.path(), "d_b_1.bin", &to_bytes(&[0.0, 0.1, -0.2]));
    let config = MorpherConfig::default()
        .with_latent(2, vec![1, 0])
        .with_image_side(2)
        .with_default_dimensions(0, 1);

    let morpher = Morpher::load(FileSource::new(dir.path()), config).await.expect("load");
    morpher.set_latent(vec![0.5, 0.5]).expect("width 2");
    let a = morpher.generate_face().expect("ready");
    let b = morpher.generate_face().expect("ready");
    let bits = |g: &morpher::PixelGrid| g.as_slice().iter().map(|p| p.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(&a), bits(&b));

    morpher.set_coordinate(0, 0.9).expect("valid dimension");
    let c = morpher.generate_face().expect("ready");
    assert_ne!(bits(&a), bits(&c));
}

/// One layer, latent width 2, a 2x2 image: pixel 0 = σ(z0), pixel 1 = σ(z1)
fn write_identity_model(dir: &Path) {
    write_asset(dir, "sizes.csv", b"4,2");
    write_asset(dir, "d_W_0.bin", &to_bytes(&[1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0]));
    write_asset(dir, "d_b_0.bin", &to_bytes(&[0.0; 4]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_generate_face_never_sees_half_applied_update() {
    let dir = TempDir::new().expect("temp dir creation should succeed");
    write_identity_model(dir.path());
    let config = MorpherConfig::default()
        .with_latent(2, vec![0, 1])
        .with_image_side(2)
        .with_default_dimensions(0, 1);

    let morpher = Arc::new(
        Morpher::load(FileSource::new(dir.path()), config).await.expect("identity model loads"),
    );
    morpher.set_latent(vec![0.0, 0.0]).expect("width 2");

    let stop = Arc::new(AtomicBool::new(false));
    let writer = {
        let morpher = Arc::clone(&morpher);
        let stop = Arc::clone(&stop);
        std::thread::spawn(move || {
            let mut step = 0u32;
            while !stop.load(Ordering::Relaxed) {
                let v = (step % 200) as f32 / 100.0 - 1.0;
                morpher.set_coordinates(v, v).expect("selected dimensions are valid");
                step = step.wrapping_add(1);
            }
        })
    };

    for _ in 0..5000 {
        let face = morpher.generate_face().expect("ready");
        let (p0, p1) = (face.as_slice()[0], face.as_slice()[1]);
        assert_eq!(p0.to_bits(), p1.to_bits(), "face mixed two latent states: {p0} vs {p1}");
    }

    stop.store(true, Ordering::Relaxed);
    writer.join().expect("writer thread should not panic");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_readiness_is_monotonic() {
    init_tracing();
    let dir = TempDir::new().expect("temp dir creation should succeed");
    write_zero_model(dir.path());

    let gate = Arc::new(Semaphore::new(0));
    let source = GatedSource { inner: FileSource::new(dir.path()), gate: Arc::clone(&gate) };
    let morpher = Morpher::create(source, zero_model_config()).expect("create");

    assert!(!morpher.is_ready());
    assert!(matches!(morpher.generate_face(), Err(Error::NotReady { .. })));

    // Release all but one blob.
    gate.add_permits(5);
    tokio::time::timeout(Duration::from_secs(5), async {
        while morpher.loaded_count() < 5 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("five blobs should load");
    assert!(!morpher.is_ready());
    assert!(matches!(morpher.load_status(), LoadStatus::Pending));
    assert!(matches!(
        morpher.generate_face(),
        Err(Error::NotReady { loaded: 5, expected: 6 })
    ));

    gate.add_permits(1);
    tokio::time::timeout(Duration::from_secs(5), morpher.wait_until_ready())
        .await
        .expect("loader should finish")
        .expect("every blob is valid");

    for _ in 0..3 {
        assert!(morpher.is_ready());
        morpher.shuffle().expect("configured range is valid");
        morpher.generate_face().expect("ready");
    }
    assert_eq!(morpher.loaded_count(), 6);
}

#[tokio::test]
async fn test_latent_editable_before_ready() {
    let dir = TempDir::new().expect("temp dir creation should succeed");
    write_zero_model(dir.path());

    let gate = Arc::new(Semaphore::new(0));
    let source = GatedSource { inner: FileSource::new(dir.path()), gate: Arc::clone(&gate) };
    let morpher = Morpher::create_seeded(source, zero_model_config(), 21).expect("create");

    morpher.set_coordinate(0, 0.75).expect("valid dimension");
    assert_eq!(morpher.get_latent().as_slice()[3], 0.75);
    morpher.select_dimensions(1, 2).expect("valid dimensions");
    morpher.set_coordinates(-0.5, 0.25).expect("valid");
    assert_eq!(morpher.get_latent().as_slice()[1], -0.5);
    assert_eq!(morpher.get_latent().as_slice()[0], 0.25);

    gate.add_permits(6);
    morpher.wait_until_ready().await.expect("load");
    assert!(morpher.is_ready());
}

#[tokio::test]
async fn test_truncated_blob_fails_load() {
    let dir = TempDir::new().expect("temp dir creation should succeed");
    write_zero_model(dir.path());
    write_asset(dir.path(), "d_W_1.bin", &to_bytes(&[0.0; 24]));

    let err = Morpher::load(FileSource::new(dir.path()), zero_model_config())
        .await
        .expect_err("d_W_1 is one float short");
    match err {
        Error::ParameterSize { name, expected, actual } => {
            assert_eq!(name, "d_W_1.bin");
            assert_eq!(expected, 100);
            assert_eq!(actual, 96);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_malformed_manifest_fails_load() {
    let dir = TempDir::new().expect("temp dir creation should succeed");
    write_asset(dir.path(), "sizes.csv", b"9,five,4");

    let morpher = Morpher::create(FileSource::new(dir.path()), zero_model_config()).expect("create");
    let err = morpher.wait_until_ready().await.expect_err("manifest is not numeric");
    assert!(matches!(err, Error::Manifest { .. }));
    assert_eq!(morpher.expected_count(), None);
    assert!(matches!(morpher.load_status(), LoadStatus::Failed(Error::Manifest { .. })));
}

#[tokio::test]
async fn test_missing_blob_reports_io_error() {
    init_tracing();
    let dir = TempDir::new().expect("temp dir creation should succeed");
    write_zero_model(dir.path());
    std::fs::remove_file(dir.path().join("d_b_2.bin")).expect("remove should succeed");

    let morpher = Morpher::create(FileSource::new(dir.path()), zero_model_config()).expect("create");
    let err = morpher.wait_until_ready().await.expect_err("d_b_2 is missing");
    assert!(matches!(err, Error::Io { .. }));
    assert!(err.to_string().contains("d_b_2.bin"));
    // The other blobs still loaded.
    assert_eq!(morpher.loaded_count(), 5);
    assert!(!morpher.is_ready());
}

#[tokio::test]
async fn test_manifest_must_match_config() {
    let dir = TempDir::new().expect("temp dir creation should succeed");
    write_zero_model(dir.path());

    let config = zero_model_config().with_image_side(4);
    let err = Morpher::load(FileSource::new(dir.path()), config).await.expect_err("9 != 16");
    assert!(matches!(err, Error::Shape { .. }));
}

#[tokio::test]
async fn test_config_from_yaml_file() {
    let dir = TempDir::new().expect("temp dir creation should succeed");
    write_single_pixel_model(dir.path());
    let yaml = "latent_dim: 2\nimage_side: 1\nindex_mapping: [0, 1]\ndefault_dimensions: [0, 1]\n";
    write_asset(dir.path(), "morpher.yaml", yaml.as_bytes());

    let config = MorpherConfig::from_file(dir.path().join("morpher.yaml")).expect("valid yaml");
    let morpher = Morpher::load(FileSource::new(dir.path()), config).await.expect("load");
    morpher.set_latent(vec![0.0, 0.0]).expect("width 2");
    let face = morpher.generate_face().expect("ready");
    assert_abs_diff_eq!(face.as_slice()[0], sigmoid(0.0), epsilon = 1e-7);
}
