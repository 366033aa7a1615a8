// ObjPack - Self-contained OBJ asset packer
// Copyright (C) 2025 ObjPack Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.


//! Test fixture data.
//!
//! Geometry and material text is inlined; images are generated on the fly so
//! the repository carries no binary fixtures.

use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;

/// Test fixture data and generators.
pub struct TestFixtures;

impl TestFixtures {
    /// Two vertices and one (degenerate) face.
    pub const PART_A_OBJ: &'static str = "v 0 0 0\nv 1 0 0\nf 1 2\n";

    /// Three vertices and one triangle.
    pub const PART_B_OBJ: &'static str = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";

    /// Unit cube with texture coordinates and normals.
    pub const CUBE_OBJ: &'static str = "\
# cube
mtllib cube.mtl
o Cube
v -1 -1 1
v 1 -1 1
v 1 1 1
v -1 1 1
v -1 -1 -1
v 1 -1 -1
v 1 1 -1
v -1 1 -1
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
vn 0 0 -1
usemtl wood
f 1/1/1 2/2/1 3/3/1 4/4/1
f 8/1/2 7/2/2 6/3/2 5/4/2
usemtl painted
f 4/1/1 3/2/1 7/3/1 8/4/1
";

    /// Library for [`Self::CUBE_OBJ`]: one found texture, one missing.
    pub const CUBE_MTL: &'static str = "\
newmtl wood
Ka 0.2 0.2 0.2
Kd 0.8 0.6 0.4
Ns 32
map_Kd -blendu on -blendv on wood.png

newmtl painted
Kd 0.1 0.3 0.9
d 0.5
map_Kd missing.jpg
";

    /// Sample TOML configuration.
    pub const SAMPLE_CONFIG: &'static str = r#"[textures]
max_resolution = 1024
convert_to_webp = false
jpeg_quality = 90

[output]
title = "Fixture Model"

[observability]
log_level = "debug"
log_format = "json"
"#;

    /// Opaque RGB gradient.
    pub fn rgb_image(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([
                (x * 255 / width.max(1)) as u8,
                (y * 255 / height.max(1)) as u8,
                128,
            ])
        })
    }

    /// PNG-encoded opaque gradient.
    pub fn png(width: u32, height: u32) -> Vec<u8> {
        Self::encode(&image::DynamicImage::ImageRgb8(Self::rgb_image(width, height)), ImageFormat::Png)
    }

    /// PNG-encoded image with alpha 128 everywhere.
    pub fn translucent_png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([20, 200, 60, 128]));
        Self::encode(&image::DynamicImage::ImageRgba8(img), ImageFormat::Png)
    }

    /// JPEG-encoded opaque gradient.
    pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
        Self::encode(&image::DynamicImage::ImageRgb8(Self::rgb_image(width, height)), ImageFormat::Jpeg)
    }

    fn encode(img: &image::DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        img.write_to(&mut cursor, format).expect("Failed to encode fixture image");
        cursor.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_images_decode() {
        let png = image::load_from_memory(&TestFixtures::png(8, 4)).unwrap();
        assert_eq!((png.width(), png.height()), (8, 4));

        let jpeg = image::load_from_memory(&TestFixtures::jpeg(8, 4)).unwrap();
        assert_eq!((jpeg.width(), jpeg.height()), (8, 4));

        let translucent = image::load_from_memory(&TestFixtures::translucent_png(2, 2)).unwrap();
        assert!(translucent.color().has_alpha());
    }
}
