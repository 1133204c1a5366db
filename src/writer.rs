//! Image encoding and chunked persistence
//!
//! Encodes the raster surface to the requested format/quality and streams the
//! bytes to the destination path in bounded-size chunks, so arbitrarily large
//! images never require unbounded buffering during the write. The destination
//! handle is unbuffered and is closed on every exit path (success or error)
//! when it goes out of scope; the success path additionally syncs to disk
//! before the handle is released.

use crate::capture::RasterSurface;
use crate::config::ImageFormat;
use crate::error::CaptureError;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};
use std::fs::OpenOptions;
use std::io::{self, Cursor, Read, Write};
use std::path::Path;
use tracing::{debug, info};

/// Fixed copy chunk size: 64 KiB.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Encode the surface's pixel buffer into the requested format.
///
/// Quality is meaningful for jpg only and is ignored for png.
pub fn encode(
    surface: &RasterSurface,
    format: ImageFormat,
    quality: u8,
) -> Result<Vec<u8>, CaptureError> {
    let mut encoded = Vec::new();
    let cursor = Cursor::new(&mut encoded);

    match format {
        ImageFormat::Jpg => {
            // The jpeg encoder rejects quality 0; the validator already caps
            // the upper bound at 100.
            let mut encoder = JpegEncoder::new_with_quality(cursor, quality.clamp(1, 100));
            encoder.encode(
                surface.image.as_raw(),
                surface.width(),
                surface.height(),
                ColorType::Rgb8,
            )?;
        }
        ImageFormat::Png => {
            PngEncoder::new(cursor).write_image(
                surface.image.as_raw(),
                surface.width(),
                surface.height(),
                ColorType::Rgb8,
            )?;
        }
    }

    debug!(
        "Encoded {}x{} surface as {:?}: {} bytes",
        surface.width(),
        surface.height(),
        format,
        encoded.len()
    );
    Ok(encoded)
}

/// Copy all bytes from `reader` to `writer` in fixed 64 KiB chunks.
///
/// Loops until the remaining byte count reaches zero and flushes the writer
/// before returning. Returns the total number of bytes copied.
pub fn copy_in_chunks<R: Read, W: Write>(reader: &mut R, writer: &mut W) -> io::Result<u64> {
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut total = 0u64;

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        writer.write_all(&buf[..n])?;
        total += n as u64;
    }

    writer.flush()?;
    Ok(total)
}

/// Write the encoded bytes to `path`, create-or-truncate, with 0644
/// permissions. Returns the number of bytes written.
pub fn persist(encoded: &[u8], path: &Path) -> Result<u64, CaptureError> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }

    let mut file = options.open(path)?;
    let written = copy_in_chunks(&mut Cursor::new(encoded), &mut file)?;
    file.sync_all()?;

    Ok(written)
}

/// Encode the surface and stream it to the destination path.
pub fn encode_and_write(
    surface: &RasterSurface,
    format: ImageFormat,
    quality: u8,
    path: &Path,
) -> Result<u64, CaptureError> {
    let encoded = encode(surface, format, quality)?;
    let written = persist(&encoded, path)?;
    info!("Wrote {} bytes to {}", written, path.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    /// Writer wrapper recording the size of every write call it receives.
    struct CountingWriter {
        writes: Vec<usize>,
        bytes: Vec<u8>,
    }

    impl CountingWriter {
        fn new() -> Self {
            Self {
                writes: Vec::new(),
                bytes: Vec::new(),
            }
        }
    }

    impl Write for CountingWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.writes.push(buf.len());
            self.bytes.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn uniform_surface(width: u32, height: u32, color: [u8; 3]) -> RasterSurface {
        RasterSurface {
            image: RgbImage::from_pixel(width, height, Rgb(color)),
        }
    }

    fn gradient_surface(width: u32, height: u32) -> RasterSurface {
        RasterSurface {
            image: RgbImage::from_fn(width, height, |x, y| {
                Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
            }),
        }
    }

    #[test]
    fn test_chunked_copy_issues_ceil_n_over_chunk_writes() {
        let payload = vec![7u8; 150_000];
        let mut writer = CountingWriter::new();

        let total = copy_in_chunks(&mut Cursor::new(&payload), &mut writer).unwrap();

        assert_eq!(total, 150_000);
        assert_eq!(writer.writes, vec![65_536, 65_536, 18_928]);
        assert_eq!(writer.writes.iter().sum::<usize>(), 150_000);
        assert_eq!(writer.bytes, payload);
    }

    #[test]
    fn test_chunked_copy_exact_chunk_boundary() {
        let payload = vec![1u8; CHUNK_SIZE];
        let mut writer = CountingWriter::new();

        let total = copy_in_chunks(&mut Cursor::new(&payload), &mut writer).unwrap();

        assert_eq!(total, CHUNK_SIZE as u64);
        assert_eq!(writer.writes, vec![CHUNK_SIZE]);
    }

    #[test]
    fn test_chunked_copy_empty_payload() {
        let payload: Vec<u8> = Vec::new();
        let mut writer = CountingWriter::new();

        let total = copy_in_chunks(&mut Cursor::new(&payload), &mut writer).unwrap();

        assert_eq!(total, 0);
        assert!(writer.writes.is_empty());
    }

    #[test]
    fn test_persist_file_length_matches_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payload.bin");
        let payload = vec![42u8; 200_000];

        let written = persist(&payload, &path).unwrap();

        assert_eq!(written, 200_000);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 200_000);
    }

    #[test]
    fn test_persist_truncates_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");

        persist(&vec![1u8; 1000], &path).unwrap();
        persist(&vec![2u8; 10], &path).unwrap();

        assert_eq!(std::fs::metadata(&path).unwrap().len(), 10);
    }

    #[test]
    fn test_persist_unwritable_path_is_fatal() {
        let err = persist(b"data", Path::new("/nonexistent-dir/out.jpg")).unwrap_err();
        assert!(matches!(err, CaptureError::IoError(_)));
        assert!(err.may_leave_partial_file());
    }

    #[test]
    fn test_png_round_trip_is_lossless() {
        let surface = uniform_surface(20, 10, [12, 200, 99]);
        let encoded = encode(&surface, ImageFormat::Png, 100).unwrap();

        let decoded = image::load_from_memory(&encoded).unwrap().to_rgb8();
        assert_eq!(decoded.width(), 20);
        assert_eq!(decoded.height(), 10);
        assert_eq!(decoded.get_pixel(5, 5).0, [12, 200, 99]);
    }

    #[test]
    fn test_jpg_decodes_within_lossy_tolerance() {
        let surface = uniform_surface(32, 32, [128, 128, 128]);
        let encoded = encode(&surface, ImageFormat::Jpg, 90).unwrap();

        let decoded = image::load_from_memory(&encoded).unwrap().to_rgb8();
        for channel in decoded.get_pixel(16, 16).0 {
            assert!((i16::from(channel) - 128).abs() <= 10);
        }
    }

    #[test]
    fn test_jpg_size_monotonic_in_quality() {
        let surface = gradient_surface(256, 128);
        let low = encode(&surface, ImageFormat::Jpg, 10).unwrap();
        let mid = encode(&surface, ImageFormat::Jpg, 50).unwrap();
        let high = encode(&surface, ImageFormat::Jpg, 90).unwrap();

        assert!(low.len() <= mid.len());
        assert!(mid.len() <= high.len());
    }

    #[test]
    fn test_quality_ignored_for_png() {
        let surface = uniform_surface(16, 16, [1, 2, 3]);
        let a = encode(&surface, ImageFormat::Png, 10).unwrap();
        let b = encode(&surface, ImageFormat::Png, 90).unwrap();
        assert_eq!(a, b);
    }
}
