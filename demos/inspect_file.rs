#![allow(missing_docs)]

//! Prints the tag tree of a PAG file.
//!
//! Usage: `cargo run --example inspect_file -- path/to/file.pag`
//! Without an argument, a small sample file is built, written, and inspected instead.

use pagcodec::graph::{Color, Composition, Layer, LayerContent, TextDocument};
use pagcodec::{Codec, Inspector};

fn main() -> pagcodec::Result<()> {
    let path = match std::env::args().nth(1) {
        Some(path) => path,
        None => write_sample("sample.pag")?,
    };

    let report = Inspector::inspect(&path)?;
    println!("{report}");

    let file = Codec::load(&path)?;
    println!(
        "{} compositions, {} layers, {} texts, {} images, tag level {} (supported {})",
        file.compositions().len(),
        file.num_layers(),
        file.num_texts(),
        file.num_images(),
        file.tag_level(),
        Codec::max_supported_tag_level()
    );
    if let Some(performance) = Codec::read_performance_data(&std::fs::read(&path)?)? {
        println!("Performance: {performance:?}");
    }
    Ok(())
}

fn write_sample(path: &str) -> pagcodec::Result<String> {
    let mut background = Layer::new(
        1,
        LayerContent::Solid {
            color: Color::new(30, 30, 30),
            width: 320,
            height: 240,
        },
    );
    background.duration = 48;

    let mut title = Layer::new(
        2,
        LayerContent::Text {
            document: Some(TextDocument::new("Hello, PAG")),
            path_option: None,
        },
    );
    title.name = "Title".into();
    title.start_time = 12;
    title.duration = 36;

    let composition = Composition::vector(1, 320, 240, 48, 24.0, vec![background, title]);
    let file = Codec::make_file(vec![composition], Vec::new())?;
    std::fs::write(path, Codec::encode(&file)?)?;
    println!(">> Wrote sample to {path}");
    Ok(path.to_string())
}
