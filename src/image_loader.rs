//! Fetches an item's image through the authenticated backend and decodes it.
//!
//! Several routes may serve the file; they are tried in order until one
//! returns something that is an image. Decoding runs on the blocking pool so
//! the editor thread stays responsive.

use image::RgbaImage;
use labeldesk_api::Backend;
use labeldesk_api::types::DbId;

use crate::error::ImageLoadError;

/// Routes that may serve the file of `item_id`, in preference order.
pub fn candidate_routes(item_id: DbId) -> [String; 2] {
    [
        format!("/api/items/{}/file", item_id),
        format!("/media/items/{}", item_id),
    ]
}

/// Whether bytes look like a format the decoder understands.
pub fn sniff_image(bytes: &[u8]) -> bool {
    image::guess_format(bytes).is_ok()
}

/// Fetch and decode the image of `item_id`.
///
/// A candidate is accepted when its content type is `image/*` or its bytes
/// sniff as an image; anything else (HTML error pages, JSON) moves on to the
/// next route.
pub async fn load_image<B: Backend + ?Sized>(
    backend: &B,
    item_id: DbId,
) -> Result<RgbaImage, ImageLoadError> {
    let routes = candidate_routes(item_id);
    let mut last_error = None;

    for route in &routes {
        let payload = match backend.fetch_raw(route).await {
            Ok(payload) => payload,
            Err(e) => {
                log::debug!("🖼️ {} failed: {}", route, e);
                last_error = Some(e.to_string());
                continue;
            }
        };
        if !payload.is_image_typed() && !sniff_image(&payload.bytes) {
            log::debug!(
                "🖼️ {} returned {:?} ({} bytes), not an image",
                route,
                payload.content_type,
                payload.bytes.len()
            );
            last_error = Some(format!("{} is not an image", route));
            continue;
        }

        log::debug!("🖼️ Decoding {} ({} bytes)", route, payload.bytes.len());
        let bytes = payload.bytes;
        let rgba = match tokio::task::spawn_blocking(move || decode(&bytes)).await? {
            Ok(rgba) => rgba,
            Err(e) => {
                log::debug!("🖼️ {} did not decode: {}", route, e);
                last_error = Some(e.to_string());
                continue;
            }
        };
        log::info!(
            "🖼️ Loaded item {}: {}x{}",
            item_id,
            rgba.width(),
            rgba.height()
        );
        return Ok(rgba);
    }

    Err(ImageLoadError::Unavailable {
        item_id,
        attempts: routes.len(),
        last_error,
    })
}

fn decode(bytes: &[u8]) -> Result<RgbaImage, ImageLoadError> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}
