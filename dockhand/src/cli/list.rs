use log::info;

use crate::{backend, engine::Engine, Result};

pub fn list(engine: &Engine) -> Result<()> {
    use comfy_table::{Attribute, Cell, ContentArrangement, Table};

    let images = engine.labeled_images(backend::IMAGE_LABEL)?;
    if images.is_empty() {
        info!("no hook images found");
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(comfy_table::presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            ["repository", "tag", "image id", "created", "size"]
                .map(|name| Cell::new(name).add_attribute(Attribute::Bold)),
        );

    for image in images {
        table.add_row([
            image.repository,
            image.tag,
            image.id,
            image.created_since,
            image.size,
        ]);
    }

    println!("{table}");

    Ok(())
}
