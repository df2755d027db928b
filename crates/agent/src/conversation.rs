use regex::Regex;
use serde::Serialize;

/// Purpose of a free-text command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Query,
    Create,
    Modify,
    Unknown,
}

/// Slots recognized in a sentence. An absent slot is an expected outcome.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedEntities {
    pub person_name: Option<String>,
    pub department: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Extraction {
    pub intent: Intent,
    pub entities: ExtractedEntities,
}

impl Extraction {
    fn unknown() -> Self {
        Self { intent: Intent::Unknown, entities: ExtractedEntities::default() }
    }
}

/// Slots a rule must fill for its match to count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequiredSlots {
    /// The name group may be empty; the intent still holds.
    NameOptional,
    NameAndDepartment,
}

/// One entry of the ordered rule table.
#[derive(Clone, Debug)]
pub struct ExtractionRule {
    pub intent: Intent,
    pub label: &'static str,
    pattern: Regex,
    required: RequiredSlots,
}

impl ExtractionRule {
    fn new(
        intent: Intent,
        label: &'static str,
        pattern: &str,
        required: RequiredSlots,
    ) -> Result<Self, regex::Error> {
        Ok(Self { intent, label, pattern: Regex::new(pattern)?, required })
    }

    fn apply(&self, text: &str) -> Option<ExtractedEntities> {
        let captures = self.pattern.captures(text)?;
        let slot = |group: &str| {
            captures
                .name(group)
                .map(|value| value.as_str().trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let entities =
            ExtractedEntities { person_name: slot("name"), department: slot("department") };

        match self.required {
            RequiredSlots::NameOptional => Some(entities),
            RequiredSlots::NameAndDepartment => {
                (entities.person_name.is_some() && entities.department.is_some())
                    .then_some(entities)
            }
        }
    }
}

/// Characters allowed inside a person name: anything but whitespace, punctuation and `的`.
const NAME: &str = r"[^\s，。！？、,.!?:：的]";
/// Department span, lazily closed by the first department marker `部`.
const DEPARTMENT: &str = r"(?P<department>[^\s，。！？、,.!?]+?部)";
/// Start of a clause plus an optional politeness filler, so fillers never land in the name.
const LEAD: &str = r"(?:^|[\s，。！？、,.!?:：])\s*(?:请问|帮我看一下|帮我看看|帮我|麻烦你|麻烦|我想|我要|请)?\s*";
const CREATE_VERB: &str = r"(?:新增|添加|创建|新建|录入)(?:一[个名位])?(?:新)?(?:员工)?[:：]?\s*";

fn build_rules() -> Result<Vec<ExtractionRule>, regex::Error> {
    use Intent::{Create, Modify, Query};
    use RequiredSlots::{NameAndDepartment, NameOptional};

    Ok(vec![
        ExtractionRule::new(
            Query,
            "query-verb",
            &format!(
                r"(?:查询|查找|查看|查一下|搜索|找)(?:一下)?(?:员工)?\s*(?P<name>{NAME}*?)(?:的|在|(?:人事)?(?:信息|账号|资料)|[\s，。！？、,.!?]|$)"
            ),
            NameOptional,
        )?,
        ExtractionRule::new(
            Query,
            "query-possessive",
            &format!(r"{LEAD}(?P<name>{NAME}+)的(?:人事)?(?:信息|账号|资料)"),
            NameOptional,
        )?,
        ExtractionRule::new(
            Query,
            "query-whereabouts",
            &format!(r"{LEAD}(?P<name>{NAME}+?)在(?:哪个|什么)部门"),
            NameOptional,
        )?,
        ExtractionRule::new(
            Create,
            "create-with-department",
            &format!(
                r"{CREATE_VERB}(?P<name>{NAME}+?)[，,\s]*的?部门(?:是|为|:|：)?\s*{DEPARTMENT}"
            ),
            NameAndDepartment,
        )?,
        ExtractionRule::new(
            Create,
            "create-into-department",
            &format!(r"{CREATE_VERB}(?P<name>{NAME}+?)\s*(?:到|进|去|加入)\s*{DEPARTMENT}"),
            NameAndDepartment,
        )?,
        ExtractionRule::new(
            Modify,
            "modify-disposal",
            &format!(
                r"(?:把|将)\s*(?P<name>{NAME}+?)\s*的?部门\s*(?:改为|修改为|更改为|调整为|改成|换成|调为)\s*{DEPARTMENT}"
            ),
            NameAndDepartment,
        )?,
        ExtractionRule::new(
            Modify,
            "modify-verb",
            &format!(
                r"(?:修改|更改|变更|调整)\s*(?P<name>{NAME}+?)\s*的?部门\s*(?:为|成|到|改为)\s*{DEPARTMENT}"
            ),
            NameAndDepartment,
        )?,
        ExtractionRule::new(
            Modify,
            "modify-transfer",
            &format!(
                r"{LEAD}(?:把|将)?\s*(?P<name>{NAME}+?)\s*(?:调到|转到|调入|调至|转入|调往)\s*{DEPARTMENT}"
            ),
            NameAndDepartment,
        )?,
    ])
}

/// Ordered rule table classifier.
///
/// Rules are grouped by intent in priority order Query, Create, Modify and
/// tried in table order. The first rule that matches decides the result; no
/// later rule is consulted even if it would capture more. A Create or Modify
/// rule whose name or department group comes back empty does not match.
#[derive(Clone, Debug)]
pub struct IntentExtractor {
    rules: Vec<ExtractionRule>,
}

impl Default for IntentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentExtractor {
    pub fn new() -> Self {
        Self::try_new().expect("built-in extraction patterns are valid regular expressions")
    }

    pub fn try_new() -> Result<Self, regex::Error> {
        Ok(Self { rules: build_rules()? })
    }

    pub fn rules(&self) -> &[ExtractionRule] {
        &self.rules
    }

    pub fn extract(&self, text: &str) -> Extraction {
        self.rules
            .iter()
            .find_map(|rule| {
                let entities = rule.apply(text)?;
                tracing::debug!(
                    event_name = "agent.conversation.rule_matched",
                    rule = rule.label,
                    intent = ?rule.intent,
                    "extraction rule matched"
                );
                Some(Extraction { intent: rule.intent, entities })
            })
            .unwrap_or_else(Extraction::unknown)
    }
}
