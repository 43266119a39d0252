use serde::{Deserialize, Serialize};

/// Image bytes used as a media item's thumbnail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtworkData {
    /// Raw image bytes
    pub data: Vec<u8>,
    /// MIME type (e.g., "image/jpeg", "image/png")
    pub mime_type: String,
}

impl ArtworkData {
    /// Create new artwork data
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
        }
    }

    /// Create artwork from raw bytes, sniffing the MIME type from the header
    ///
    /// Unknown headers fall back to "application/octet-stream".
    pub fn from_bytes(data: Vec<u8>) -> Self {
        let mime_type = sniff_mime_type(&data);
        Self::new(data, mime_type)
    }

    /// File extension matching the MIME type
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/png" => "png",
            "image/gif" => "gif",
            "image/bmp" => "bmp",
            "image/tiff" => "tiff",
            "image/jpeg" | "image/jpg" => "jpg",
            _ => "bin",
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

fn sniff_mime_type(data: &[u8]) -> &'static str {
    match data {
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        [b'B', b'M', ..] => "image/bmp",
        [b'I', b'I', 0x2A, 0x00, ..] | [b'M', b'M', 0x00, 0x2A, ..] => "image/tiff",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_common_image_headers() {
        let png = ArtworkData::from_bytes(vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A]);
        assert_eq!(png.mime_type, "image/png");
        assert_eq!(png.extension(), "png");

        let jpeg = ArtworkData::from_bytes(vec![0xFF, 0xD8, 0xFF, 0xE0]);
        assert_eq!(jpeg.mime_type, "image/jpeg");
        assert_eq!(jpeg.extension(), "jpg");
    }

    #[test]
    fn unknown_bytes_fall_back_to_octet_stream() {
        let artwork = ArtworkData::from_bytes(vec![1, 2, 3]);
        assert_eq!(artwork.mime_type, "application/octet-stream");
        assert_eq!(artwork.extension(), "bin");
    }

    #[test]
    fn length_of_image_bytes() {
        let artwork = ArtworkData::new(b"cover".to_vec(), "image/jpeg");
        assert_eq!(artwork.len(), 5);
        assert!(!artwork.is_empty());
    }
}
