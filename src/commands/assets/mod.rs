//! Asset commands

mod prune_assets;
mod upload_image;

pub use prune_assets::PruneAssetsCommand;
pub use upload_image::UploadImageCommand;
