use image::{codecs::jpeg::JpegEncoder, imageops, ImageBuffer, RgbImage};

use crate::error::{Result, StreamError};

const JPEG_QUALITY: u8 = 90;

/// One decoded image pulled from a video source, RGB24 row-major.
pub struct RawFrame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Turn a raw frame into JPEG bytes at exactly `target` dimensions.
///
/// The resize does not preserve aspect ratio; the source is stretched to the
/// configured output resolution. `flip` reverses the pixel row order.
pub fn encode_frame(frame: RawFrame, target: (u32, u32), flip: bool) -> Result<Vec<u8>> {
    let RawFrame {
        data,
        width,
        height,
    } = frame;

    let img: RgbImage = ImageBuffer::from_raw(width, height, data).ok_or_else(|| {
        StreamError::FrameRead(format!("frame buffer does not match {}x{}", width, height))
    })?;

    let (target_w, target_h) = target;
    let mut img = if (width, height) != target {
        imageops::resize(&img, target_w, target_h, imageops::FilterType::Triangle)
    } else {
        img
    };

    if flip {
        imageops::flip_vertical_in_place(&mut img);
    }

    let mut jpeg = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY);
    encoder.encode(img.as_raw(), target_w, target_h, image::ColorType::Rgb8)?;
    Ok(jpeg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_frame(width: u32, height: u32) -> RawFrame {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            let level = (y * 255 / height.max(1)) as u8;
            for _ in 0..width {
                data.extend_from_slice(&[level, level, level]);
            }
        }
        RawFrame {
            data,
            width,
            height,
        }
    }

    fn decode(jpeg: &[u8]) -> RgbImage {
        image::load_from_memory(jpeg).unwrap().to_rgb8()
    }

    #[test]
    fn output_is_jpeg() {
        let jpeg = encode_frame(gradient_frame(32, 24), (32, 24), false).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        assert_eq!(&jpeg[jpeg.len() - 2..], &[0xFF, 0xD9]);
    }

    #[test]
    fn resizes_to_target_dimensions() {
        let jpeg = encode_frame(gradient_frame(64, 48), (32, 18), false).unwrap();
        let img = decode(&jpeg);
        assert_eq!(img.dimensions(), (32, 18));
    }

    #[test]
    fn upscales_small_sources() {
        let jpeg = encode_frame(gradient_frame(16, 9), (64, 36), false).unwrap();
        assert_eq!(decode(&jpeg).dimensions(), (64, 36));
    }

    #[test]
    fn flip_reverses_row_order() {
        let size = (32, 32);
        let plain = decode(&encode_frame(gradient_frame(32, 32), size, false).unwrap());
        let flipped = decode(&encode_frame(gradient_frame(32, 32), size, true).unwrap());

        // Gradient is dark at the top, bright at the bottom. After the flip
        // the brightness ordering inverts (JPEG is lossy, so compare with a
        // generous margin).
        let row_level = |img: &RgbImage, y: u32| -> u32 {
            (0..32).map(|x| img.get_pixel(x, y)[0] as u32).sum::<u32>() / 32
        };
        assert!(row_level(&plain, 0) + 64 < row_level(&plain, 31));
        assert!(row_level(&flipped, 31) + 64 < row_level(&flipped, 0));
    }

    #[test]
    fn rejects_short_buffer() {
        let frame = RawFrame {
            data: vec![0u8; 10],
            width: 32,
            height: 24,
        };
        assert!(encode_frame(frame, (32, 24), false).is_err());
    }
}
