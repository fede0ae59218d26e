use crate::error::REQUEST_FAILED;
use crate::rich_text::RichText;
use course_studio_shared::{
    AnalysisRow, CourseDetails, Mcq, MessageBody, Operation, ResponseFamily, WireResponse,
};
use serde::Serialize;

/// Contents of the generic slot: everything that arrives in `message`, plus errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum GenericResponse {
    Text(String),
    Material(RichText),
    Analysis(Vec<AnalysisRow>),
}

/// A response ready for display. Material has already been sanitized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ResponsePayload {
    Course(CourseDetails),
    Modules(Vec<String>),
    Mcqs(Vec<Mcq>),
    Generic(GenericResponse),
}

/// Borrowed view of a payload, as handed to the formatter.
#[derive(Debug, Clone, Copy)]
pub enum ResponseView<'a> {
    Course(&'a CourseDetails),
    Modules(&'a [String]),
    Mcqs(&'a [Mcq]),
    Generic(&'a GenericResponse),
}

impl ResponsePayload {
    /// Converts a decoded body into a displayable payload. HTML is only trusted
    /// for Generate Material, and only after sanitizing.
    pub fn from_wire(operation: Operation, wire: WireResponse) -> Self {
        match wire {
            WireResponse::Course(course) => ResponsePayload::Course(course),
            WireResponse::Modules(modules) => ResponsePayload::Modules(modules),
            WireResponse::Mcqs(mcqs) => ResponsePayload::Mcqs(mcqs),
            WireResponse::Message(MessageBody::Analysis(rows)) => {
                ResponsePayload::Generic(GenericResponse::Analysis(rows))
            }
            WireResponse::Message(MessageBody::Text(html))
                if operation == Operation::GenerateMaterial =>
            {
                ResponsePayload::Generic(GenericResponse::Material(RichText::sanitize(&html)))
            }
            WireResponse::Message(MessageBody::Text(text)) => {
                ResponsePayload::Generic(GenericResponse::Text(text))
            }
        }
    }

    pub fn request_failed() -> Self {
        ResponsePayload::Generic(GenericResponse::Text(REQUEST_FAILED.to_string()))
    }

    pub fn family(&self) -> ResponseFamily {
        match self {
            ResponsePayload::Course(_) => ResponseFamily::Course,
            ResponsePayload::Modules(_) => ResponseFamily::Modules,
            ResponsePayload::Mcqs(_) => ResponseFamily::Mcqs,
            ResponsePayload::Generic(_) => ResponseFamily::Generic,
        }
    }

    pub fn view(&self) -> ResponseView<'_> {
        match self {
            ResponsePayload::Course(course) => ResponseView::Course(course),
            ResponsePayload::Modules(modules) => ResponseView::Modules(modules),
            ResponsePayload::Mcqs(mcqs) => ResponseView::Mcqs(mcqs),
            ResponsePayload::Generic(generic) => ResponseView::Generic(generic),
        }
    }
}

impl ResponseView<'_> {
    pub fn family(&self) -> ResponseFamily {
        match self {
            ResponseView::Course(_) => ResponseFamily::Course,
            ResponseView::Modules(_) => ResponseFamily::Modules,
            ResponseView::Mcqs(_) => ResponseFamily::Mcqs,
            ResponseView::Generic(_) => ResponseFamily::Generic,
        }
    }
}

/// The four mutually exclusive holders of the latest result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseSlots {
    course: Option<CourseDetails>,
    modules: Option<Vec<String>>,
    mcqs: Option<Vec<Mcq>>,
    generic: Option<GenericResponse>,
}

impl ResponseSlots {
    /// Stores `payload` in its slot and empties the other three.
    pub fn store(&mut self, payload: ResponsePayload) {
        *self = Self::default();
        match payload {
            ResponsePayload::Course(course) => self.course = Some(course),
            ResponsePayload::Modules(modules) => self.modules = Some(modules),
            ResponsePayload::Mcqs(mcqs) => self.mcqs = Some(mcqs),
            ResponsePayload::Generic(generic) => self.generic = Some(generic),
        }
        debug_assert_eq!(self.populated(), 1);
    }

    /// Empties every slot that does not belong to `family`.
    pub fn retain_family(&mut self, family: ResponseFamily) {
        if family != ResponseFamily::Course {
            self.course = None;
        }
        if family != ResponseFamily::Modules {
            self.modules = None;
        }
        if family != ResponseFamily::Mcqs {
            self.mcqs = None;
        }
        if family != ResponseFamily::Generic {
            self.generic = None;
        }
    }

    pub fn course(&self) -> Option<&CourseDetails> {
        self.course.as_ref()
    }

    pub fn modules(&self) -> Option<&[String]> {
        self.modules.as_deref()
    }

    pub fn mcqs(&self) -> Option<&[Mcq]> {
        self.mcqs.as_deref()
    }

    pub fn generic(&self) -> Option<&GenericResponse> {
        self.generic.as_ref()
    }

    pub fn populated(&self) -> usize {
        [
            self.course.is_some(),
            self.modules.is_some(),
            self.mcqs.is_some(),
            self.generic.is_some(),
        ]
        .into_iter()
        .filter(|filled| *filled)
        .count()
    }

    /// Whichever slot currently holds a result.
    pub fn active(&self) -> Option<ResponseView<'_>> {
        self.course()
            .map(ResponseView::Course)
            .or_else(|| self.modules().map(ResponseView::Modules))
            .or_else(|| self.mcqs().map(ResponseView::Mcqs))
            .or_else(|| self.generic().map(ResponseView::Generic))
    }
}
