use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The task a user asks the course service to perform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    #[default]
    #[serde(rename = "Generate Course")]
    GenerateCourse,
    #[serde(rename = "Generate Modules")]
    GenerateModules,
    #[serde(rename = "Generate Material")]
    GenerateMaterial,
    #[serde(rename = "Generate Summary")]
    GenerateSummary,
    #[serde(rename = "Generate Example")]
    GenerateExample,
    #[serde(rename = "Clarify Doubt")]
    ClarifyDoubt,
    #[serde(rename = "Generate MCQ")]
    GenerateMcq,
    #[serde(rename = "Analyze Content")]
    AnalyzeContent,
}

/// Which response slot an operation's result lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseFamily {
    Course,
    Modules,
    Mcqs,
    Generic,
}

impl Operation {
    pub const ALL: [Operation; 8] = [
        Operation::GenerateCourse,
        Operation::GenerateModules,
        Operation::GenerateMaterial,
        Operation::GenerateSummary,
        Operation::GenerateExample,
        Operation::ClarifyDoubt,
        Operation::GenerateMcq,
        Operation::AnalyzeContent,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Operation::GenerateCourse => "Generate Course",
            Operation::GenerateModules => "Generate Modules",
            Operation::GenerateMaterial => "Generate Material",
            Operation::GenerateSummary => "Generate Summary",
            Operation::GenerateExample => "Generate Example",
            Operation::ClarifyDoubt => "Clarify Doubt",
            Operation::GenerateMcq => "Generate MCQ",
            Operation::AnalyzeContent => "Analyze Content",
        }
    }

    /// Endpoint path segment: the label with spaces as underscores, lowercased.
    pub fn endpoint(self) -> String {
        self.label().replace(' ', "_").to_lowercase()
    }

    pub fn family(self) -> ResponseFamily {
        match self {
            Operation::GenerateCourse => ResponseFamily::Course,
            Operation::GenerateModules => ResponseFamily::Modules,
            Operation::GenerateMcq => ResponseFamily::Mcqs,
            _ => ResponseFamily::Generic,
        }
    }

    /// Name of the top-level JSON field holding this operation's result.
    pub fn response_field(self) -> &'static str {
        match self.family() {
            ResponseFamily::Course => "course_details",
            ResponseFamily::Modules => "module_details",
            ResponseFamily::Mcqs => "mcqs",
            ResponseFamily::Generic => "message",
        }
    }

    pub fn takes_doubt(self) -> bool {
        self == Operation::ClarifyDoubt
    }

    pub fn takes_user_answer(self) -> bool {
        self == Operation::AnalyzeContent
    }

    fn position(self) -> usize {
        Self::ALL
            .iter()
            .position(|op| *op == self)
            .unwrap_or_default()
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.position() + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Self {
        let len = Self::ALL.len();
        Self::ALL[(self.position() + len - 1) % len]
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown operation '{0}'")]
pub struct UnknownOperation(pub String);

impl FromStr for Operation {
    type Err = UnknownOperation;

    /// Accepts either the label ("Generate MCQ") or the endpoint name ("generate_mcq").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.label().eq_ignore_ascii_case(needle) || op.endpoint() == needle)
            .ok_or_else(|| UnknownOperation(s.to_string()))
    }
}

/// Body POSTed to every endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub input: String,
    pub course_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doubt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_answer: Option<String>,
}

impl GenerateRequest {
    /// Builds the body for `operation`, keeping only the optional field that
    /// operation takes.
    pub fn for_operation(
        operation: Operation,
        input: impl Into<String>,
        course_id: impl Into<String>,
        doubt: impl Into<String>,
        user_answer: impl Into<String>,
    ) -> Self {
        Self {
            input: input.into(),
            course_id: course_id.into(),
            doubt: operation.takes_doubt().then(|| doubt.into()),
            user_answer: operation.takes_user_answer().then(|| user_answer.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseDetails {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Hours to complete.
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub chapters: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mcq {
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRow {
    #[serde(deserialize_with = "text_or_number")]
    pub question_number: String,
    pub question: String,
    pub options: Vec<String>,
    pub selected_answer: String,
    pub correct_answer: String,
    pub explanation: String,
}

fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrNumber {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match TextOrNumber::deserialize(deserializer)? {
        TextOrNumber::Text(text) => text,
        TextOrNumber::Number(number) => number.to_string(),
    })
}

/// The `message` field: prose, HTML, or analysis rows depending on endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageBody {
    Text(String),
    Analysis(Vec<AnalysisRow>),
}

#[derive(Debug, Deserialize)]
struct CourseEnvelope {
    course_details: CourseDetails,
}

#[derive(Debug, Deserialize)]
struct ModulesEnvelope {
    module_details: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct McqEnvelope {
    mcqs: Vec<Mcq>,
}

#[derive(Debug, Deserialize)]
struct MessageEnvelope {
    message: MessageBody,
}

/// A decoded response body, before any client-side post-processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireResponse {
    Course(CourseDetails),
    Modules(Vec<String>),
    Mcqs(Vec<Mcq>),
    Message(MessageBody),
}

impl WireResponse {
    /// Extracts the field `operation` consumes from a response body. Any other
    /// fields are ignored.
    pub fn decode(operation: Operation, body: &[u8]) -> Result<Self, serde_json::Error> {
        Ok(match operation.family() {
            ResponseFamily::Course => {
                WireResponse::Course(serde_json::from_slice::<CourseEnvelope>(body)?.course_details)
            }
            ResponseFamily::Modules => {
                WireResponse::Modules(serde_json::from_slice::<ModulesEnvelope>(body)?.module_details)
            }
            ResponseFamily::Mcqs => WireResponse::Mcqs(serde_json::from_slice::<McqEnvelope>(body)?.mcqs),
            ResponseFamily::Generic => {
                WireResponse::Message(serde_json::from_slice::<MessageEnvelope>(body)?.message)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn endpoints_are_lowercased_with_underscores() {
        let endpoints: Vec<String> = Operation::ALL.iter().map(|op| op.endpoint()).collect();
        assert_eq!(
            endpoints,
            vec![
                "generate_course",
                "generate_modules",
                "generate_material",
                "generate_summary",
                "generate_example",
                "clarify_doubt",
                "generate_mcq",
                "analyze_content",
            ]
        );
    }

    #[test]
    fn parses_labels_and_endpoints() {
        assert_eq!("Generate MCQ".parse::<Operation>(), Ok(Operation::GenerateMcq));
        assert_eq!("clarify_doubt".parse::<Operation>(), Ok(Operation::ClarifyDoubt));
        assert_eq!(
            "Generate Everything".parse::<Operation>(),
            Err(UnknownOperation("Generate Everything".into()))
        );
    }

    #[test]
    fn cycling_wraps_both_ways() {
        assert_eq!(Operation::AnalyzeContent.next(), Operation::GenerateCourse);
        assert_eq!(Operation::GenerateCourse.previous(), Operation::AnalyzeContent);
        let mut op = Operation::default();
        for _ in 0..Operation::ALL.len() {
            op = op.next();
        }
        assert_eq!(op, Operation::default());
    }

    #[test]
    fn doubt_only_sent_for_clarify_doubt() {
        for op in Operation::ALL {
            let body = serde_json::to_value(GenerateRequest::for_operation(
                op, "in", "CS1", "why?", "1,2",
            ))
            .unwrap();
            assert_eq!(body.get("doubt").is_some(), op == Operation::ClarifyDoubt, "{op}");
            assert_eq!(
                body.get("user_answer").is_some(),
                op == Operation::AnalyzeContent,
                "{op}"
            );
        }
    }

    #[test]
    fn modules_request_body_has_only_base_fields() {
        let body = serde_json::to_value(GenerateRequest::for_operation(
            Operation::GenerateModules,
            "Intro to Graphs",
            "CS201",
            "",
            "",
        ))
        .unwrap();
        assert_eq!(body, json!({"input": "Intro to Graphs", "course_id": "CS201"}));
    }

    #[test]
    fn decodes_course_with_missing_fields() {
        let body = json!({"course_details": {"title": "Graphs", "chapters": ["BFS", "DFS"]}});
        let decoded =
            WireResponse::decode(Operation::GenerateCourse, body.to_string().as_bytes()).unwrap();
        assert_eq!(
            decoded,
            WireResponse::Course(CourseDetails {
                title: "Graphs".into(),
                description: String::new(),
                duration: 0,
                chapters: vec!["BFS".into(), "DFS".into()],
            })
        );
    }

    #[test]
    fn decodes_analysis_rows_with_numeric_question_number() {
        let body = json!({"message": [{
            "question_number": 3,
            "question": "2+2?",
            "options": ["3", "4", "5", "6"],
            "selected_answer": "3",
            "correct_answer": "4",
            "explanation": "arithmetic"
        }]});
        let decoded =
            WireResponse::decode(Operation::AnalyzeContent, body.to_string().as_bytes()).unwrap();
        match decoded {
            WireResponse::Message(MessageBody::Analysis(rows)) => {
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0].question_number, "3");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn wrong_field_is_a_decode_error() {
        let body = json!({"message": "hello"});
        assert!(WireResponse::decode(Operation::GenerateMcq, body.to_string().as_bytes()).is_err());
    }
}
