//! 画像読み込みモジュール

use crate::error::LoadError;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::path::{Path, PathBuf};
use tracing::debug;

/// デコード済み画像
///
/// 1回の認識の間だけ保持し、認識後に破棄する
pub struct DecodedImage {
    path: PathBuf,
    image: DynamicImage,
}

impl DecodedImage {
    /// 読み込み元のパス
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// デコード済みのビットマップをPNGとして書き出す
    ///
    /// ファイル入力のみ受け付けるエンジン向け
    pub fn write_png(&self, dest: &Path) -> Result<(), image::ImageError> {
        self.image.save_with_format(dest, ImageFormat::Png)
    }
}

/// 画像ファイルを読み込みデコードする
///
/// 形式は拡張子ではなくファイル内容から判定する
pub fn load(path: &str) -> Result<DecodedImage, LoadError> {
    let file_path = Path::new(path);
    if !file_path.is_file() {
        return Err(LoadError::NotFound {
            path: path.to_string(),
        });
    }

    let decode_error = |source| LoadError::Decode {
        path: path.to_string(),
        source,
    };

    let image = ImageReader::open(file_path)
        .map_err(|e| decode_error(image::ImageError::IoError(e)))?
        .with_guessed_format()
        .map_err(|e| decode_error(image::ImageError::IoError(e)))?
        .decode()
        .map_err(decode_error)?;

    debug!(
        "画像を読み込みました: {} ({}x{})",
        path,
        image.width(),
        image.height()
    );

    Ok(DecodedImage {
        path: file_path.to_path_buf(),
        image,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::fs;
    use tempfile::TempDir;

    fn write_test_png(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        let img = RgbImage::from_pixel(32, 16, Rgb([255, 255, 255]));
        img.save_with_format(&path, ImageFormat::Png).unwrap();
        path
    }

    #[test]
    fn test_load_missing_file() {
        let result = load("/no/such/file.png");
        let err = result.err().unwrap();
        assert!(matches!(err, LoadError::NotFound { .. }));
        assert_eq!(
            err.to_string(),
            "Failed to load image from file: /no/such/file.png"
        );
    }

    #[test]
    fn test_load_png() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_test_png(&temp_dir, "sample.png");

        let image = load(path.to_str().unwrap()).unwrap();
        assert_eq!(image.width(), 32);
        assert_eq!(image.height(), 16);
        assert_eq!(image.path(), path.as_path());
    }

    #[test]
    fn test_load_detects_format_from_content() {
        let temp_dir = TempDir::new().unwrap();
        // 拡張子がJPEGでも中身はPNG
        let png = write_test_png(&temp_dir, "sample.png");
        let renamed = temp_dir.path().join("sample.jpg");
        fs::rename(&png, &renamed).unwrap();

        assert!(load(renamed.to_str().unwrap()).is_ok());
    }

    #[test]
    fn test_load_undecodable_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.png");
        fs::write(&path, b"this is not an image").unwrap();

        let err = load(path.to_str().unwrap()).err().unwrap();
        assert!(matches!(err, LoadError::Decode { .. }));
        assert!(err
            .to_string()
            .starts_with("Failed to load image from file: "));
    }

    #[test]
    fn test_load_directory_is_not_an_image() {
        let temp_dir = TempDir::new().unwrap();
        let result = load(temp_dir.path().to_str().unwrap());
        assert!(matches!(result, Err(LoadError::NotFound { .. })));
    }

    #[test]
    fn test_write_png() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_test_png(&temp_dir, "sample.png");
        let image = load(path.to_str().unwrap()).unwrap();

        let dest = temp_dir.path().join("copy.png");
        image.write_png(&dest).unwrap();
        assert!(load(dest.to_str().unwrap()).is_ok());
    }
}
