// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
use arbor_engine::Node;

#[allow(dead_code)]
pub fn generate_document(blocks: usize) -> Vec<Node> {
    (0..blocks)
        .map(|i| match i % 4 {
            0 => Node::element("heading-two", vec![Node::text(format!("Section {i}"))]),
            1 => Node::element(
                "paragraph",
                vec![
                    Node::text("Paragraph with a "),
                    Node::element("link", vec![Node::text("link")]),
                    Node::text(" and some search terms to find."),
                ],
            ),
            2 => Node::element(
                "bulleted-list",
                vec![
                    Node::element("list-item", vec![Node::text("Bullet point")]),
                    Node::element("list-item", vec![Node::text("Another search item")]),
                ],
            ),
            _ => Node::element("paragraph", vec![Node::text("Plain text. ".repeat(8))]),
        })
        .collect()
}

/// Fragmented texts that normalization has to merge back together.
#[allow(dead_code)]
pub fn generate_fragmented_document(blocks: usize, fragments: usize) -> Vec<Node> {
    (0..blocks)
        .map(|_| {
            let texts = (0..fragments).map(|i| Node::text(format!("f{i} "))).collect();
            Node::element("paragraph", texts)
        })
        .collect()
}
