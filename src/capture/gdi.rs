//! Screen capture using GDI `BitBlt`.

use image::{DynamicImage, ImageBuffer, Rgba};
use std::ffi::c_void;

use windows::Win32::Foundation::HWND;
use windows::Win32::Graphics::Gdi::{
    BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, DeleteDC, DeleteObject, GetDC, GetDIBits,
    ReleaseDC, SelectObject, BITMAPINFO, BITMAPINFOHEADER, BI_RGB, CAPTUREBLT, DIB_RGB_COLORS,
    SRCCOPY,
};
use windows::Win32::UI::WindowsAndMessaging::{GetSystemMetrics, SM_CXSCREEN, SM_CYSCREEN};

use crate::automation::config::RelativeRect;
use crate::error::{Error, Result};

/// Captures the primary screen, or the given relative region of it.
///
/// The frame is copied through a memory DC, read back as top-down 32-bit
/// BGRA and converted to RGBA.
pub fn capture_screen(region: Option<&RelativeRect>) -> Result<DynamicImage> {
    let screen_width = unsafe { GetSystemMetrics(SM_CXSCREEN) };
    let screen_height = unsafe { GetSystemMetrics(SM_CYSCREEN) };
    if screen_width <= 0 || screen_height <= 0 {
        return Err(Error::Capture("no primary screen".into()));
    }

    let (x, y, width, height) = region
        .copied()
        .unwrap_or_default()
        .to_pixels(screen_width as u32, screen_height as u32);
    let (x, y, width, height) = (x as i32, y as i32, width as i32, height as i32);

    log::debug!("Capturing {}x{} at ({}, {})", width, height, x, y);

    unsafe {
        let screen_dc = GetDC(HWND::default());
        if screen_dc.is_invalid() {
            return Err(Error::Capture("GetDC failed".into()));
        }

        let mem_dc = CreateCompatibleDC(screen_dc);
        let bitmap = CreateCompatibleBitmap(screen_dc, width, height);
        let old_obj = SelectObject(mem_dc, bitmap);

        let blit = BitBlt(
            mem_dc,
            0,
            0,
            width,
            height,
            screen_dc,
            x,
            y,
            SRCCOPY | CAPTUREBLT,
        );

        let mut info = BITMAPINFO {
            bmiHeader: BITMAPINFOHEADER {
                biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                biWidth: width,
                // Negative height requests a top-down DIB
                biHeight: -height,
                biPlanes: 1,
                biBitCount: 32,
                biCompression: BI_RGB.0,
                ..Default::default()
            },
            ..Default::default()
        };

        let mut buffer = vec![0u8; (width * height * 4) as usize];
        let lines = if blit.is_ok() {
            GetDIBits(
                mem_dc,
                bitmap,
                0,
                height as u32,
                Some(buffer.as_mut_ptr() as *mut c_void),
                &mut info,
                DIB_RGB_COLORS,
            )
        } else {
            0
        };

        SelectObject(mem_dc, old_obj);
        let _ = DeleteObject(bitmap);
        let _ = DeleteDC(mem_dc);
        ReleaseDC(HWND::default(), screen_dc);

        if let Err(e) = blit {
            return Err(Error::Capture(format!("BitBlt failed: {}", e)));
        }
        if lines != height {
            return Err(Error::Capture(format!(
                "GetDIBits returned {} of {} lines",
                lines, height
            )));
        }

        // BGRA -> RGBA
        for pixel in buffer.chunks_exact_mut(4) {
            pixel.swap(0, 2);
            pixel[3] = 255;
        }

        let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_raw(width as u32, height as u32, buffer)
                .ok_or_else(|| Error::ImageDecode("pixel buffer size mismatch".into()))?;
        Ok(DynamicImage::ImageRgba8(img))
    }
}
