//! Helpers shared by the `qrtool` binary and the benches: dataset discovery,
//! environment knobs, buffer statistics and reading-rate bookkeeping.

use crate::config::DecodeOptions;
use crate::error::QrError;
use crate::loader::{ImageInput, load_pixel_buffer};
use crate::models::PixelBuffer;
use crate::utils::grayscale::luminance_view;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "bmp"];
const DEFAULT_DATASET_ROOT: &str = "benches/images/boofcv";

fn env_flag(name: &str) -> bool {
    matches!(
        env::var(name).as_deref(),
        Ok("1") | Ok("true") | Ok("TRUE") | Ok("yes") | Ok("YES")
    )
}

/// Positive integer from the environment; unset, unparsable and `0` all mean
/// "not set".
fn env_positive<T: std::str::FromStr + PartialEq + Default>(name: &str) -> Option<T> {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .filter(|v| *v != T::default())
}

/// Downscale override from `QR_MAX_DIM`.
pub fn max_dim_from_env() -> Option<u32> {
    env_positive("QR_MAX_DIM")
}

/// Apply `QR_MAX_DIM` and `QR_AGGRESSIVE` on top of `options`.
pub fn options_from_env(mut options: DecodeOptions) -> DecodeOptions {
    if let Some(max_dim) = max_dim_from_env() {
        options.downscale_max_dim = max_dim;
    }
    if env_flag("QR_AGGRESSIVE") {
        options.aggressive = true;
    }
    options
}

/// Load an image file the way the decode API would.
pub fn load_buffer<P: AsRef<Path>>(
    path: P,
    options: &DecodeOptions,
) -> Result<PixelBuffer, QrError> {
    load_pixel_buffer(&ImageInput::path(path), options.downscale_max_dim)
}

/// Dataset root from `QR_DATASET_ROOT`.
pub fn dataset_root_from_env() -> PathBuf {
    env::var("QR_DATASET_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATASET_ROOT))
}

/// Image limit from `QR_BENCH_LIMIT`; `None` (unset or `0`) means the whole
/// dataset.
pub fn bench_limit_from_env() -> Option<usize> {
    env_positive("QR_BENCH_LIMIT")
}

/// Smoke-list flag from `QR_SMOKE`.
pub fn smoke_from_env() -> bool {
    env_flag("QR_SMOKE")
}

/// Luma range of a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LumaStats {
    /// Darkest luma
    pub min: u8,
    /// Brightest luma
    pub max: u8,
    /// Mean luma, floored
    pub avg: u8,
}

/// Min/max/mean luma of `buffer`.
pub fn luma_stats(buffer: &PixelBuffer) -> LumaStats {
    let luma = luminance_view(buffer);
    if luma.is_empty() {
        return LumaStats { min: 0, max: 0, avg: 0 };
    }
    let (min, max, sum) = luma.iter().fold((u8::MAX, u8::MIN, 0u64), |(lo, hi, sum), &v| {
        (lo.min(v), hi.max(v), sum + v as u64)
    });
    LumaStats {
        min,
        max,
        avg: (sum / luma.len() as u64) as u8,
    }
}

/// Fraction of pixels whose luma is 0.
pub fn black_ratio(buffer: &PixelBuffer) -> f64 {
    let luma = luminance_view(buffer);
    if luma.is_empty() {
        return 0.0;
    }
    luma.iter().filter(|&&v| v == 0).count() as f64 / luma.len() as f64
}

/// Number of QR codes described by a BoofCV label file.
///
/// Two layouts exist: a `SETS` header followed by one 8-number line per code,
/// and an older one with a 2-number line per corner (four per code).
/// Unreadable or unrecognised files count as 0.
pub fn parse_expected_qr_count<P: AsRef<Path>>(label_path: P) -> usize {
    let Ok(content) = fs::read_to_string(label_path) else {
        return 0;
    };

    let mut after_sets = false;
    let (mut sets_codes, mut quad_lines, mut corner_lines) = (0usize, 0usize, 0usize);
    for line in content.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.eq_ignore_ascii_case("SETS") {
            after_sets = true;
            continue;
        }
        let numbers = line
            .split_whitespace()
            .map(|t| t.parse::<f64>())
            .collect::<Result<Vec<_>, _>>();
        let count = match numbers {
            Ok(values) if !values.is_empty() => values.len(),
            _ => continue,
        };
        match (after_sets, count) {
            (true, n) if n >= 8 => sets_codes += 1,
            (false, n) if n >= 8 => quad_lines += 1,
            (false, 2) => corner_lines += 1,
            _ => {}
        }
    }

    if after_sets {
        sets_codes
    } else if quad_lines > 0 {
        quad_lines
    } else {
        corner_lines / 4
    }
}

/// Reading-rate tally over a labelled dataset
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReadingRate {
    /// Images with a label file
    pub labelled: usize,
    /// Labelled images where at least one code was decoded
    pub decoded: usize,
    /// Codes the labels describe
    pub expected_codes: usize,
    /// Distinct codes decoded, capped per image at the expected count
    pub found_codes: usize,
    /// Time spent decoding
    pub elapsed: Duration,
}

impl ReadingRate {
    /// Record one labelled image.
    pub fn record(&mut self, expected: usize, found: usize, elapsed: Duration) {
        self.labelled += 1;
        if found > 0 {
            self.decoded += 1;
        }
        self.expected_codes += expected;
        self.found_codes += found.min(expected);
        self.elapsed += elapsed;
    }

    /// Percentage of labelled images with a decode
    pub fn image_rate(&self) -> f64 {
        percent(self.decoded, self.labelled)
    }

    /// Percentage of labelled codes decoded
    pub fn code_rate(&self) -> f64 {
        percent(self.found_codes, self.expected_codes)
    }

    /// Merge another tally into this one
    pub fn merge(&mut self, other: &ReadingRate) {
        self.labelled += other.labelled;
        self.decoded += other.decoded;
        self.expected_codes += other.expected_codes;
        self.found_codes += other.found_codes;
        self.elapsed += other.elapsed;
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

/// Dataset images in sorted order, optionally restricted to the `_smoke.txt`
/// list and truncated to `limit`.
pub fn dataset_iter<P: AsRef<Path>>(
    root: P,
    limit: Option<usize>,
    smoke: bool,
) -> impl Iterator<Item = PathBuf> {
    let root = root.as_ref();
    let mut images = smoke
        .then(|| load_smoke_list(root))
        .flatten()
        .unwrap_or_else(|| collect_images(root));
    images.sort();
    if let Some(limit) = limit {
        images.truncate(limit);
    }
    images.into_iter()
}

fn load_smoke_list(root: &Path) -> Option<Vec<PathBuf>> {
    let contents = fs::read_to_string(root.join("_smoke.txt")).ok()?;
    let paths: Vec<PathBuf> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            let candidate = Path::new(line);
            if candidate.is_absolute() {
                candidate.to_path_buf()
            } else {
                root.join(candidate)
            }
        })
        .filter(|path| path.exists())
        .collect();
    (!paths.is_empty()).then_some(paths)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

fn collect_images(root: &Path) -> Vec<PathBuf> {
    let mut pending = vec![root.to_path_buf()];
    let mut images = Vec::new();
    while let Some(dir) = pending.pop() {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for path in entries.flatten().map(|entry| entry.path()) {
            if path.is_dir() {
                pending.push(path);
            } else if is_image(&path) {
                images.push(path);
            }
        }
    }
    images
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_path(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock before UNIX epoch")
            .as_nanos();
        let seq = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        env::temp_dir().join(format!("qr_cascade_{nanos}_{seq}_{name}"))
    }

    fn write_label(contents: &str) -> PathBuf {
        let path = temp_path("label.txt");
        fs::write(&path, contents).expect("failed to write temp label file");
        path
    }

    #[test]
    fn test_label_sets_layout() {
        let path = write_label("# points\nSETS\n1 2 3 4 5 6 7 8\n9 10 11 12 13 14 15 16\n");
        assert_eq!(parse_expected_qr_count(&path), 2);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_label_corner_layout() {
        let corners = "1.0 2.0\n".repeat(8);
        let path = write_label(&format!("# points\n{corners}"));
        assert_eq!(parse_expected_qr_count(&path), 2);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_label_garbage_is_zero() {
        let path = write_label("foo bar\n# nothing\n");
        assert_eq!(parse_expected_qr_count(&path), 0);
        let _ = fs::remove_file(path);
        assert_eq!(parse_expected_qr_count(temp_path("missing.txt")), 0);
    }

    #[test]
    fn test_dataset_iter_finds_images_recursively() {
        let root = temp_path("dataset");
        fs::create_dir_all(root.join("nested")).unwrap();
        fs::write(root.join("b.PNG"), b"x").unwrap();
        fs::write(root.join("nested/a.jpg"), b"x").unwrap();
        fs::write(root.join("nested/a.txt"), b"x").unwrap();

        let all: Vec<PathBuf> = dataset_iter(&root, None, false).collect();
        assert_eq!(all, vec![root.join("b.PNG"), root.join("nested/a.jpg")]);
        assert_eq!(dataset_iter(&root, Some(1), false).count(), 1);

        fs::write(root.join("_smoke.txt"), "# smoke\nnested/a.jpg\nmissing.png\n").unwrap();
        let smoke: Vec<PathBuf> = dataset_iter(&root, None, true).collect();
        assert_eq!(smoke, vec![root.join("nested/a.jpg")]);
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn test_stats() {
        let buf = PixelBuffer::new(2, 1, vec![0, 0, 0, 255, 200, 200, 200, 255]).unwrap();
        assert_eq!(luma_stats(&buf), LumaStats { min: 0, max: 200, avg: 100 });
        assert_eq!(black_ratio(&buf), 0.5);
    }

    #[test]
    fn test_reading_rate() {
        let mut rate = ReadingRate::default();
        rate.record(2, 1, Duration::from_millis(5));
        rate.record(1, 0, Duration::from_millis(5));
        rate.record(0, 3, Duration::from_millis(5));
        assert_eq!(rate.labelled, 3);
        assert_eq!(rate.decoded, 2);
        assert_eq!(rate.found_codes, 1);
        assert_eq!(rate.expected_codes, 3);
        assert!((rate.image_rate() - 66.666).abs() < 0.01);

        let mut total = ReadingRate::default();
        total.merge(&rate);
        assert_eq!(total, rate);
    }
}
