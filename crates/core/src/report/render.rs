use crate::report::aggregate::DisplayNameIndex;
use crate::report::ranking::{RankedEntry, Rankings};

pub const RECEIVED_TITLE: &str = "Recognitions received";
pub const GIVEN_TITLE: &str = "Recognitions given";
pub const REACTIONS_TITLE: &str = "Reactions";
pub const HASHTAGS_TITLE: &str = "Hashtag usage";

const USER_HEADER: &str = "| Name | Count |";
const HASHTAG_HEADER: &str = "| Hashtag | Count |";
const ALIGNMENT_ROW: &str = "| :--- | ---: |";

/// Renders the four rankings as markdown tables, in a fixed section order.
pub fn render(rankings: &Rankings, names: &DisplayNameIndex) -> String {
    let user_label = |key: &str| names.display_name(key).unwrap_or(key).to_owned();
    let sections = [
        section(RECEIVED_TITLE, USER_HEADER, &rankings.received, user_label),
        section(GIVEN_TITLE, USER_HEADER, &rankings.given, user_label),
        section(REACTIONS_TITLE, USER_HEADER, &rankings.reactions, user_label),
        section(HASHTAGS_TITLE, HASHTAG_HEADER, &rankings.hashtags, str::to_owned),
    ];

    sections.join("\n\n")
}

fn section(
    title: &str,
    header: &str,
    entries: &[RankedEntry],
    label: impl Fn(&str) -> String,
) -> String {
    let mut out = format!("{title}\n\n{header}\n{ALIGNMENT_ROW}\n");
    for entry in entries {
        out.push_str(&format!("|{}|{}|\n", escape_cell(&label(&entry.key)), entry.count));
    }
    out
}

fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|")
}
