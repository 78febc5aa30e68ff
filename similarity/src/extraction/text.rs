use db::models::Element;

pub const TEXT_BLOCK_TYPE: &str = "TextBlock";

/// Splits free text into blocks separated by one or more blank lines.
///
/// Blocks are numbered in order of appearance; the number doubles as the reference.
pub fn extract_text_blocks(content: &str) -> Vec<Element> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in content.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line.trim());
        }
    }
    if !current.is_empty() {
        blocks.push(current.join("\n"));
    }

    blocks
        .into_iter()
        .enumerate()
        .map(|(i, block)| Element::new(format!("{TEXT_BLOCK_TYPE}:{i}"), TEXT_BLOCK_TYPE, block, ""))
        .collect()
}
