//! Boundary with the host's image decoding service.
//!
//! The engine never parses image formats. It hands an [`ImageRequest`] to an
//! [`ImageDecoder`] and stores whatever opaque [`ImageHandle`] comes back.

use crate::Result;
use async_trait::async_trait;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// What to decode: a URI to fetch, or bytes a programmatic source produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRequest {
    Uri(String),
    Bytes(Arc<[u8]>),
}

impl ImageRequest {
    pub fn uri(&self) -> Option<&str> {
        match self {
            ImageRequest::Uri(uri) => Some(uri),
            ImageRequest::Bytes(_) => None,
        }
    }
}

/// Opaque, cheaply cloneable handle to a decoded image owned by the host.
#[derive(Clone)]
pub struct ImageHandle(Arc<dyn Any + Send + Sync>);

impl ImageHandle {
    pub fn new<T: Any + Send + Sync>(image: T) -> Self {
        Self(Arc::new(image))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// True if both handles refer to the same decoded image.
    pub fn ptr_eq(&self, other: &ImageHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageHandle({:p})", Arc::as_ptr(&self.0))
    }
}

/// Asynchronous image decode service provided by the host.
#[async_trait]
pub trait ImageDecoder: Send + Sync {
    async fn decode(&self, request: ImageRequest) -> Result<ImageHandle>;
}

#[cfg(feature = "http")]
pub use http_impl::{DecodedImage, HttpImageDecoder};

#[cfg(feature = "http")]
mod http_impl {
    use super::{ImageDecoder, ImageHandle, ImageRequest};
    use crate::{MapError, Result};
    use async_trait::async_trait;
    use once_cell::sync::Lazy;

    /// Shared async HTTP client for tile fetching
    static HTTP_CLIENT: Lazy<std::result::Result<reqwest::Client, String>> = Lazy::new(|| {
        reqwest::Client::builder()
            .user_agent(concat!("mapcontrol/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .pool_max_idle_per_host(16)
            .build()
            .map_err(|e| e.to_string())
    });

    /// RGBA8 pixels, the handle payload produced by [`HttpImageDecoder`].
    #[derive(Debug, Clone)]
    pub struct DecodedImage {
        pub width: u32,
        pub height: u32,
        pub pixels: Vec<u8>,
    }

    /// Fetches with `reqwest` and decodes with `image`.
    ///
    /// `reqwest` needs a Tokio reactor, so pair this with `TokioSpawner`.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct HttpImageDecoder;

    impl HttpImageDecoder {
        fn decode_bytes(bytes: &[u8]) -> Result<ImageHandle> {
            let image = image::load_from_memory(bytes)
                .map_err(|e| MapError::ImageLoad(e.to_string()))?
                .to_rgba8();
            Ok(ImageHandle::new(DecodedImage {
                width: image.width(),
                height: image.height(),
                pixels: image.into_raw(),
            }))
        }
    }

    #[async_trait]
    impl ImageDecoder for HttpImageDecoder {
        async fn decode(&self, request: ImageRequest) -> Result<ImageHandle> {
            match request {
                ImageRequest::Bytes(bytes) => Self::decode_bytes(&bytes),
                ImageRequest::Uri(uri) => {
                    let client = HTTP_CLIENT
                        .as_ref()
                        .map_err(|e| MapError::ImageLoad(e.clone()))?;
                    let response = client.get(&uri).send().await?.error_for_status()?;
                    let bytes = response.bytes().await?;
                    Self::decode_bytes(&bytes)
                }
            }
        }
    }
}
