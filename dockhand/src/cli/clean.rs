use log::info;

use crate::{backend, engine::Engine, Result};

pub fn clean(engine: &Engine) -> Result<()> {
    let images = engine.labeled_images(backend::IMAGE_LABEL)?;
    if images.is_empty() {
        info!("no hook images to remove");
        return Ok(());
    }

    let references: Vec<String> = images
        .iter()
        .map(|image| format!("{}:{}", image.repository, image.tag))
        .collect();
    engine.remove_images(&references)?;
    info!("removed {count} hook image(s)", count = references.len());

    Ok(())
}
