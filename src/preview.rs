//! Pure projection of a form snapshot into a preview display tree.

use crate::form::{EducationEntry, ExperienceEntry, FormSnapshot};
use serde::Serialize;

pub const PREVIEW_TITLE: &str = "CV Preview";

/// Visual role of a line of preview text. The layout picks font size and
/// weight from this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Title,
    Name,
    Contact,
    SectionHeading,
    EntryHeading,
    Caption,
    Paragraph,
    Bullet,
}

/// One experience or education block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryBlock {
    pub heading: String,
    pub lines: Vec<(BlockKind, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "items", rename_all = "snake_case")]
pub enum SectionBody {
    Entries(Vec<EntryBlock>),
    Bullets(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub heading: String,
    pub body: SectionBody,
}

/// Display tree for the CV preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewTree {
    pub title: String,
    pub name: String,
    pub contact: String,
    pub sections: Vec<Section>,
}

impl PreviewTree {
    /// Flattens the tree into lines in display order.
    pub fn blocks(&self) -> Vec<(BlockKind, &str)> {
        let mut out = vec![
            (BlockKind::Title, self.title.as_str()),
            (BlockKind::Name, self.name.as_str()),
            (BlockKind::Contact, self.contact.as_str()),
        ];

        for section in &self.sections {
            out.push((BlockKind::SectionHeading, section.heading.as_str()));
            match &section.body {
                SectionBody::Entries(entries) => {
                    for entry in entries {
                        out.push((BlockKind::EntryHeading, entry.heading.as_str()));
                        out.extend(entry.lines.iter().map(|(kind, text)| (*kind, text.as_str())));
                    }
                }
                SectionBody::Bullets(items) => {
                    out.extend(items.iter().map(|item| (BlockKind::Bullet, item.as_str())));
                }
            }
        }

        out
    }

    /// Text content of the preview, one line per block.
    pub fn text_content(&self) -> String {
        self.blocks()
            .into_iter()
            .map(|(_, text)| text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Projects `snapshot` into a preview tree.
///
/// Empty fields stay empty; entries keep their sequence order.
pub fn render(snapshot: &FormSnapshot) -> PreviewTree {
    let personal = &snapshot.personal;

    PreviewTree {
        title: PREVIEW_TITLE.to_string(),
        name: personal.name.clone(),
        contact: format!("{} | {}", personal.email, personal.phone),
        sections: vec![
            Section {
                heading: "Experience".to_string(),
                body: SectionBody::Entries(
                    snapshot.experiences.iter().map(|e| experience_block(e)).collect(),
                ),
            },
            Section {
                heading: "Education".to_string(),
                body: SectionBody::Entries(
                    snapshot.educations.iter().map(|e| education_block(e)).collect(),
                ),
            },
            Section {
                heading: "Skills".to_string(),
                body: SectionBody::Bullets(snapshot.skills.iter().map(|s| s.to_string()).collect()),
            },
        ],
    }
}

fn experience_block(exp: &ExperienceEntry) -> EntryBlock {
    EntryBlock {
        heading: format!("{} at {}", exp.position, exp.company),
        lines: vec![
            (BlockKind::Caption, exp.duration.clone()),
            (BlockKind::Paragraph, exp.description.clone()),
        ],
    }
}

fn education_block(edu: &EducationEntry) -> EntryBlock {
    EntryBlock {
        heading: edu.degree.clone(),
        lines: vec![(
            BlockKind::Paragraph,
            format!("{}, {}", edu.institution, edu.year),
        )],
    }
}
