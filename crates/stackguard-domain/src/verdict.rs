use serde_json::Value as JsonValue;
use stackguard_types::PropertyPointer;

/// What a rule concluded about one evaluated unit (a resource, a function, the deployment).
#[derive(Clone, Debug, PartialEq)]
pub enum Verdict {
    Approved,
    Failed(Violation),
}

impl Verdict {
    pub fn is_failed(&self) -> bool {
        matches!(self, Verdict::Failed(_))
    }

    pub fn violation(&self) -> Option<&Violation> {
        match self {
            Verdict::Failed(v) => Some(v),
            Verdict::Approved => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Violation {
    pub code: &'static str,
    pub message: String,
    /// Logical ID of the offending resource, if the failure is tied to one.
    pub resource: Option<String>,
    pub pointer: Option<PropertyPointer>,
    /// The offending literal, when one location can hold several.
    pub subject: Option<String>,
    pub help: Option<&'static str>,
    pub data: JsonValue,
}

impl Violation {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            resource: None,
            pointer: None,
            subject: None,
            help: None,
            data: JsonValue::Null,
        }
    }

    pub fn at(mut self, resource: &str, pointer: PropertyPointer) -> Self {
        self.resource = Some(resource.to_string());
        self.pointer = Some(pointer);
        self
    }

    pub fn subject(mut self, value: &str) -> Self {
        self.subject = Some(value.to_string());
        self
    }

    pub fn help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }

    pub fn data(mut self, data: JsonValue) -> Self {
        self.data = data;
        self
    }
}

/// Verdicts produced by one rule during one run.
#[derive(Clone, Debug, PartialEq)]
pub enum RuleStatus {
    Evaluated(Vec<Verdict>),
    /// The rule could not produce an answer (bad configuration or an internal fault).
    Errored(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct RuleOutcome {
    pub rule_id: &'static str,
    pub status: RuleStatus,
}

impl RuleOutcome {
    pub fn verdicts(&self) -> &[Verdict] {
        match &self.status {
            RuleStatus::Evaluated(v) => v,
            RuleStatus::Errored(_) => &[],
        }
    }

    pub fn approvals(&self) -> usize {
        self.verdicts().iter().filter(|v| !v.is_failed()).count()
    }

    pub fn failures(&self) -> usize {
        self.verdicts().iter().filter(|v| v.is_failed()).count()
    }

    pub fn is_errored(&self) -> bool {
        matches!(self.status, RuleStatus::Errored(_))
    }
}
