pub mod detector;
pub mod fallback;
pub mod primary;

use crate::{error::Result, intake::ImageInput, models::DetectionResponse};
use async_trait::async_trait;

pub use detector::{HttpDetector, ObjectDetector};
pub use fallback::FallbackStrategy;
pub use primary::PrimaryStrategy;

/// One way of turning an image into classified items.
#[async_trait]
pub trait DetectionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Ok` with an empty response means "nothing found"; `Err` means the
    /// strategy could not run. Both let the caller move on.
    async fn detect(&self, image: &ImageInput) -> Result<DetectionResponse>;
}
