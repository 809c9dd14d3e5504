//! Synthetic frame helpers for tests.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use tiff::encoder::{TiffEncoder, colortype};

pub(crate) fn write_gray16(path: &Path, width: usize, height: usize, f: impl Fn(usize, usize) -> u16) {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            data.push(f(x, y));
        }
    }
    let file = File::create(path).unwrap();
    TiffEncoder::new(file)
        .unwrap()
        .write_image::<colortype::Gray16>(width as u32, height as u32, &data)
        .unwrap();
}

pub(crate) fn write_gray32(path: &Path, width: usize, height: usize, f: impl Fn(usize, usize) -> u32) {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            data.push(f(x, y));
        }
    }
    let file = File::create(path).unwrap();
    TiffEncoder::new(file)
        .unwrap()
        .write_image::<colortype::Gray32>(width as u32, height as u32, &data)
        .unwrap();
}

pub(crate) fn write_rgb8<const N: usize>(path: &Path, width: usize, height: usize, pixels: [[u8; 3]; N]) {
    assert_eq!(N, width * height);
    let data: Vec<u8> = pixels.iter().flatten().copied().collect();
    let file = File::create(path).unwrap();
    TiffEncoder::new(file)
        .unwrap()
        .write_image::<colortype::RGB8>(width as u32, height as u32, &data)
        .unwrap();
}

pub(crate) fn write_corrupt_frame(path: &Path) {
    fs::write(path, b"definitely not a tiff").unwrap();
}

/// Writes `count` square frames named `<prefix>_<i>.tif`, with pixel values
/// given per region disc by `value(frame_index, region_index)` and 0 elsewhere.
///
/// Frames listed in `corrupt` are written as undecodable files.
pub(crate) fn write_run(
    dir: &Path,
    prefix: &str,
    count: usize,
    size: usize,
    regions: &[crate::mask::Region],
    corrupt: &[usize],
    value: impl Fn(usize, usize) -> u16,
) -> Vec<PathBuf> {
    let masks = crate::mask::region_masks(size, size, regions);
    let mut paths = Vec::with_capacity(count);
    for i in 0..count {
        let path = dir.join(format!("{prefix}_{i}.tif"));
        if corrupt.contains(&i) {
            write_corrupt_frame(&path);
        } else {
            write_gray16(&path, size, size, |x, y| {
                masks
                    .iter()
                    .position(|m| *m.grid().get(x, y))
                    .map_or(0, |r| value(i, r))
            });
        }
        paths.push(path);
    }
    paths
}
