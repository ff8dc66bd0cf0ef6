use std::{
    fs::File,
    io::BufWriter,
    path::Path,
};

use anyhow::{anyhow, Context, Result};

use ppu_evt_viewer::{
    event::{parse_with_diagnostics, Event, ParsedTrace},
    framebuffer::Framebuffer,
};

pub fn read_trace_file(path: impl AsRef<Path>) -> Result<ParsedTrace> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read trace {}", path.display()))?;
    Ok(parse_with_diagnostics(&text))
}

/// Loads an image file as unmultiplied RGBA8 pixels: `(width, height, data)`
pub fn read_rgba_image(path: impl AsRef<Path>) -> Result<(usize, usize, Vec<u8>)> {
    let path = path.as_ref();
    let img = image::open(path)
        .with_context(|| format!("Failed to load image {}", path.display()))?
        .to_rgba8();
    let (width, height) = img.dimensions();
    Ok((width as usize, height as usize, img.into_raw()))
}

pub fn save_framebuffer_png(fb: &Framebuffer, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let img = image::RgbaImage::from_raw(fb.width() as u32, fb.height() as u32, fb.data.clone())
        .ok_or_else(|| anyhow!("Framebuffer data doesn't match its {}x{} size", fb.width(), fb.height()))?;
    img.save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub fn write_events_json(events: &[Event], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let f = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(f), events)?;
    Ok(())
}
