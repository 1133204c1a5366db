//! Full-page raster capture
//!
//! Produces a raster surface matching the full document dimensions from the
//! live rendered page. The document height is sampled exactly once, at
//! capture time, which is why the capture is deferred until layout has
//! stabilized. The paint first clears the surface to opaque white and then
//! composites the rendered content, so no pixel of the output is transparent
//! or undefined regardless of the page background.

use crate::error::CaptureError;
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::{Page, ScreenshotParams};
use image::{imageops, Rgba, RgbaImage, RgbImage};
use tracing::debug;

/// In-memory pixel buffer of the full rendered page.
///
/// Width is the configured capture width; height is the document's full
/// scroll height at capture time. Owned until encoding completes, then
/// discarded.
#[derive(Debug)]
pub struct RasterSurface {
    pub image: RgbImage,
}

impl RasterSurface {
    /// Build the surface from the browser's rendered PNG bytes.
    ///
    /// The surface is first filled with opaque white, then the rendered
    /// content is composited over it at (0,0). Content beyond the surface
    /// bounds is clipped; missing content is left white.
    pub fn from_rendered_png(png: &[u8], width: u32, height: u32) -> Result<Self, CaptureError> {
        let rendered = image::load_from_memory(png)
            .map_err(|e| CaptureError::CaptureFailed(e.to_string()))?
            .to_rgba8();

        let mut canvas = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
        imageops::overlay(&mut canvas, &rendered, 0, 0);

        Ok(Self {
            image: image::DynamicImage::ImageRgba8(canvas).to_rgb8(),
        })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Capture the live page as a `width × scrollHeight` raster surface.
///
/// Synchronous with respect to the pipeline step: no I/O is performed here
/// beyond the browser protocol round-trips. Fails fast if the surface cannot
/// be produced; there is no partial capture or retry.
pub async fn capture(page: &Page, width: u32) -> Result<RasterSurface, CaptureError> {
    let height = measure_scroll_height(page).await?;
    debug!("Document scroll height: {} px", height);

    apply_viewport(page, width, height).await?;

    let png = page
        .screenshot(
            ScreenshotParams::builder()
                .format(CaptureScreenshotFormat::Png)
                .full_page(true)
                .build(),
        )
        .await
        .map_err(|e| CaptureError::CaptureFailed(e.to_string()))?;

    RasterSurface::from_rendered_png(&png, width, height)
}

/// Sample the full scrollable document height. Called exactly once per run.
pub async fn measure_scroll_height(page: &Page) -> Result<u32, CaptureError> {
    let height: u64 = page
        .evaluate("document.documentElement.scrollHeight")
        .await
        .map_err(|e| CaptureError::CaptureFailed(e.to_string()))?
        .into_value()
        .map_err(|e| CaptureError::CaptureFailed(e.to_string()))?;

    Ok(height.max(1) as u32)
}

/// Override the browser viewport using the Chrome DevTools Protocol.
pub async fn apply_viewport(page: &Page, width: u32, height: u32) -> Result<(), CaptureError> {
    let params = SetDeviceMetricsOverrideParams::builder()
        .width(width)
        .height(height)
        .device_scale_factor(1.0)
        .mobile(false)
        .build()
        .map_err(|e| CaptureError::BrowserError(e.to_string()))?;

    page.execute(params)
        .await
        .map_err(|e| CaptureError::BrowserError(e.to_string()))?;

    Ok(())
}
