#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderableSeverity {
    Info,
    Warning,
    Error,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderableVerdictStatus {
    Pass,
    Warn,
    Fail,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderableRuleStatus {
    Approved,
    Failed,
    Errored,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableLocation {
    pub resource: String,
    pub pointer: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableFinding {
    pub severity: RenderableSeverity,
    pub rule_id: Option<String>,
    pub code: String,
    pub message: String,
    pub location: Option<RenderableLocation>,
    pub help: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableRule {
    pub rule_id: String,
    pub status: RenderableRuleStatus,
    pub approvals: u32,
    pub failures: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableData {
    /// Template path as given on the command line; used as the annotation file.
    pub template: Option<String>,
    pub profile: String,
    pub findings_total: u32,
    pub rules_evaluated: u32,
    pub rules_skipped: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableReport {
    pub verdict: RenderableVerdictStatus,
    pub findings: Vec<RenderableFinding>,
    pub rules: Vec<RenderableRule>,
    pub data: RenderableData,
}
