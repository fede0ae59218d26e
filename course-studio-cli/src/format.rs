//! One formatter for every place a response is shown: the live response box and
//! each entry replayed in the history sidebar.

use crate::response::{GenericResponse, ResponseView};
use crate::rich_text::{RichBlock, RichSpan, TextStyle};
use course_studio_shared::{AnalysisRow, CourseDetails, Mcq, Operation};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedLine {
    pub indent: u16,
    pub spans: Vec<RichSpan>,
}

impl FormattedLine {
    fn new(spans: Vec<RichSpan>) -> Self {
        Self { indent: 0, spans }
    }

    fn indented(mut self, indent: u16) -> Self {
        self.indent = indent;
        self
    }

    fn blank() -> Self {
        Self::new(Vec::new())
    }
}

fn span(text: impl Into<String>, style: TextStyle) -> RichSpan {
    RichSpan {
        text: text.into(),
        style,
    }
}

fn field(label: &str, value: impl Into<String>) -> FormattedLine {
    FormattedLine::new(vec![
        span(format!("{label}: "), TextStyle::Label),
        span(value, TextStyle::Plain),
    ])
}

fn bullet(text: &str) -> FormattedLine {
    FormattedLine::new(vec![span("• ", TextStyle::Muted), span(text, TextStyle::Plain)]).indented(2)
}

fn heading(text: &str) -> FormattedLine {
    FormattedLine::new(vec![span(text, TextStyle::Heading)])
}

fn muted(text: &str) -> Vec<FormattedLine> {
    vec![FormattedLine::new(vec![span(text, TextStyle::Muted)])]
}

fn prose(text: &str) -> Vec<FormattedLine> {
    if text.trim().is_empty() {
        return muted("(empty response)");
    }
    text.lines()
        .map(|line| FormattedLine::new(vec![span(line, TextStyle::Plain)]))
        .collect()
}

fn title_for(operation: Operation) -> Option<&'static str> {
    match operation {
        Operation::GenerateCourse => None,
        Operation::GenerateModules => Some("Modules:"),
        Operation::GenerateMaterial => Some("Generated Material:"),
        Operation::GenerateSummary => Some("Generated Summary:"),
        Operation::GenerateExample => Some("Generated Example:"),
        Operation::ClarifyDoubt => Some("Answer:"),
        Operation::GenerateMcq => Some("Generated MCQs:"),
        Operation::AnalyzeContent => Some("Analysis:"),
    }
}

/// Renders the response `operation` produced into display lines. The payload's
/// shape selects the layout; the operation supplies the title. A failure stored
/// outside the operation's own family is shown untitled.
pub fn format_response(operation: Operation, response: ResponseView<'_>) -> Vec<FormattedLine> {
    let mut lines = Vec::new();
    if operation.family() == response.family() {
        if let Some(title) = title_for(operation) {
            lines.push(heading(title));
        }
    }
    lines.extend(format_body(response));
    lines
}

fn format_body(response: ResponseView<'_>) -> Vec<FormattedLine> {
    match response {
        ResponseView::Course(course) => format_course(course),
        ResponseView::Modules(modules) => modules.iter().map(|module| bullet(module)).collect(),
        ResponseView::Mcqs(mcqs) => format_mcqs(mcqs),
        ResponseView::Generic(GenericResponse::Text(text)) => prose(text),
        ResponseView::Generic(GenericResponse::Material(rich)) if rich.is_empty() => {
            muted("(no material returned)")
        }
        ResponseView::Generic(GenericResponse::Material(rich)) => format_rich_blocks(rich.blocks()),
        ResponseView::Generic(GenericResponse::Analysis(rows)) => format_analysis(rows),
    }
}

fn format_course(course: &CourseDetails) -> Vec<FormattedLine> {
    let mut lines = vec![
        field("Course Name", course.title.as_str()),
        field("Description", course.description.as_str()),
        field("Duration", format!("{} hours", course.duration)),
        FormattedLine::new(vec![span("Chapters:", TextStyle::Label)]),
    ];
    lines.extend(course.chapters.iter().map(|chapter| bullet(chapter)));
    lines
}

fn format_mcqs(mcqs: &[Mcq]) -> Vec<FormattedLine> {
    let mut lines = Vec::new();
    for mcq in mcqs {
        lines.push(FormattedLine::blank());
        lines.push(FormattedLine::new(vec![span(mcq.question.as_str(), TextStyle::Strong)]));
        for (idx, option) in mcq.options.iter().enumerate() {
            lines.push(
                FormattedLine::new(vec![span(format!("{}. {}", idx + 1, option), TextStyle::Plain)])
                    .indented(2),
            );
        }
        lines.push(field("Correct Answer", mcq.answer.as_str()));
    }
    lines
}

const ANALYSIS_COLUMNS: [&str; 6] = [
    "Question Number",
    "Question",
    "Options",
    "Your Answer",
    "Correct Answer",
    "Explanation",
];

// A terminal is too narrow for six columns of prose, so each row is laid out as
// a labelled record under the same column headers.
fn format_analysis(rows: &[AnalysisRow]) -> Vec<FormattedLine> {
    let mut lines = Vec::new();
    for row in rows {
        lines.push(FormattedLine::blank());
        lines.push(field(ANALYSIS_COLUMNS[0], row.question_number.as_str()));
        lines.push(field(ANALYSIS_COLUMNS[1], row.question.as_str()));
        lines.push(FormattedLine::new(vec![span(
            format!("{}:", ANALYSIS_COLUMNS[2]),
            TextStyle::Label,
        )]));
        lines.extend(row.options.iter().map(|option| bullet(option)));
        lines.push(field(ANALYSIS_COLUMNS[3], row.selected_answer.as_str()));
        lines.push(field(ANALYSIS_COLUMNS[4], row.correct_answer.as_str()));
        lines.push(field(ANALYSIS_COLUMNS[5], row.explanation.as_str()));
    }
    lines
}

fn format_rich_blocks(blocks: &[RichBlock]) -> Vec<FormattedLine> {
    let mut lines = Vec::new();
    for block in blocks {
        match block {
            RichBlock::Heading { level, spans } => {
                let text: String = spans.iter().map(|s| s.text.as_str()).collect();
                let width = text.chars().count();
                lines.push(FormattedLine::new(vec![span(text, TextStyle::Heading)]));
                // h1 gets a double rule, h2 a single one, h3 none
                let rule = match level {
                    1 => Some("═"),
                    2 => Some("─"),
                    _ => None,
                };
                if let Some(rule) = rule {
                    lines.push(FormattedLine::new(vec![span(rule.repeat(width), TextStyle::Muted)]));
                }
            }
            RichBlock::Paragraph { spans } => lines.push(FormattedLine::new(spans.clone())),
            RichBlock::ListItem { spans } => {
                let mut item = vec![span("• ", TextStyle::Muted)];
                item.extend(spans.iter().cloned());
                lines.push(FormattedLine::new(item).indented(2));
            }
            RichBlock::Preformatted { text } => lines.extend(
                text.lines()
                    .map(|line| FormattedLine::new(vec![span(line, TextStyle::Code)]).indented(4)),
            ),
            RichBlock::Blank => lines.push(FormattedLine::blank()),
        }
    }
    lines
}
