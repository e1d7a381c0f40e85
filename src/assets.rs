// Bundled static assets
// The QR panel is a shipped image, decoded once at startup; it is not
// generated from the dropped file

use anyhow::{Context, Result};

/// Raw bytes of the bundled QR code graphic
const QR_BYTES: &[u8] = include_bytes!("../assets/qrcode.png");

/// A decoded asset ready for blitting, stored as opaque BGRA to match
/// the canvas layout
#[derive(Debug, Clone)]
pub struct Sprite {
    pub width: u32,
    pub height: u32,
    pub bgra: Vec<u8>,
}

impl Sprite {
    fn from_bytes(data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(data).context("Failed to decode bundled asset")?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();

        let mut bgra = rgba.into_raw();
        for pixel in bgra.chunks_exact_mut(4) {
            pixel.swap(0, 2); // RGBA -> BGRA
        }

        Ok(Self {
            width,
            height,
            bgra,
        })
    }
}

/// Decode the bundled QR code graphic
pub fn qr_code() -> Result<Sprite> {
    Sprite::from_bytes(QR_BYTES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_qr_decodes() {
        let qr = qr_code().expect("bundled asset must decode");
        assert!(qr.width > 0 && qr.height > 0);
        assert_eq!(qr.bgra.len(), (qr.width * qr.height * 4) as usize);
        // quiet-zone corner is white, fully opaque
        assert_eq!(&qr.bgra[0..4], &[255, 255, 255, 255]);
    }
}
