//! Markdown rendering of grouped sources.

use super::ResourceGroup;

/// Render one group: linked heading, cleaned description, then one link per
/// deep link labelled with its sorted times.
pub fn render_group_markdown(group: &ResourceGroup) -> String {
    let mut out = format!("### [{}]({})\n", group.display_title(), group.parent_url);

    let description = group.description();
    if !description.trim().is_empty() {
        out.push_str(description.trim());
        out.push('\n');
    }

    let links: Vec<String> = group
        .child_moments
        .iter()
        .map(|m| format!("[{}]({})", m.label(), m.url))
        .collect();
    if !links.is_empty() {
        out.push('\n');
        out.push_str(&links.join(" | "));
        out.push('\n');
    }

    out
}

/// Render every group, separated by blank lines.
pub fn render_markdown(groups: &[ResourceGroup]) -> String {
    groups
        .iter()
        .map(render_group_markdown)
        .collect::<Vec<_>>()
        .join("\n")
}
