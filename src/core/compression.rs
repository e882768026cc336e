// Decompression of dataset snapshot files

use crate::core::error::{DashboardError, Result};
use flate2::read::{GzDecoder, ZlibDecoder};
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionType {
    None,
    Gzip,
    Zlib,
    Lz4,
    Zstd,
}

impl CompressionType {
    /// Picks the codec from the file extension; anything unknown is read as-is.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("gz") => CompressionType::Gzip,
            Some("zz") | Some("zlib") => CompressionType::Zlib,
            Some("lz4") => CompressionType::Lz4,
            Some("zst") => CompressionType::Zstd,
            _ => CompressionType::None,
        }
    }
}

pub fn decompress(data: &[u8], compression: CompressionType) -> Result<Vec<u8>> {
    match compression {
        CompressionType::None => Ok(data.to_vec()),

        CompressionType::Gzip => {
            let mut decoder = GzDecoder::new(data);
            let mut decompressed = Vec::new();
            decoder
                .read_to_end(&mut decompressed)
                .map_err(|e| DashboardError::DecompressionFailed(format!("Gzip: {}", e)))?;
            Ok(decompressed)
        }

        CompressionType::Zlib => {
            let mut decoder = ZlibDecoder::new(data);
            let mut decompressed = Vec::new();
            decoder
                .read_to_end(&mut decompressed)
                .map_err(|e| DashboardError::DecompressionFailed(format!("Zlib: {}", e)))?;
            Ok(decompressed)
        }

        #[cfg(feature = "lz4")]
        CompressionType::Lz4 => lz4::block::decompress(data, None)
            .map_err(|e| DashboardError::DecompressionFailed(format!("LZ4: {}", e))),

        #[cfg(not(feature = "lz4"))]
        CompressionType::Lz4 => Err(DashboardError::UnsupportedCompression("lz4".to_string())),

        #[cfg(feature = "zstd")]
        CompressionType::Zstd => zstd::decode_all(data)
            .map_err(|e| DashboardError::DecompressionFailed(format!("Zstd: {}", e))),

        #[cfg(not(feature = "zstd"))]
        CompressionType::Zstd => Err(DashboardError::UnsupportedCompression("zstd".to_string())),
    }
}
