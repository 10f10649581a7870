use crate::model::Subsections;

use super::elements::Block;

/// Group a flat run of blocks into `heading → body`.
///
/// Paragraphs and list items accumulate under the most recent heading; text
/// before the first heading has nowhere to go and is dropped. The open
/// subsection is committed at the end, so the last one on the page is kept.
pub fn cluster_subsections(blocks: &[Block]) -> Subsections {
    let mut subsections = Subsections::new();
    let mut current_heading: Option<String> = None;
    let mut current_body = String::new();

    for block in blocks {
        match block {
            Block::Heading(text) => {
                if let Some(heading) = current_heading.take() {
                    commit(&mut subsections, heading, std::mem::take(&mut current_body));
                }
                current_body.clear();
                current_heading = Some(text.clone());
            }
            Block::ListItem(text) => {
                current_body.push_str("\n- ");
                current_body.push_str(text);
            }
            Block::Paragraph(text) => {
                current_body.push('\n');
                current_body.push_str(text);
            }
            Block::Skipped(_) => {}
        }
    }

    if let Some(heading) = current_heading {
        commit(&mut subsections, heading, current_body);
    }

    subsections
}

/// A repeated heading replaces the earlier body but keeps its position.
fn commit(subsections: &mut Subsections, heading: String, body: String) {
    subsections.insert(heading, body.trim().to_string());
}
