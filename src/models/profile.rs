use serde::{Deserialize, Serialize};

/// 填写值：页面上只有文本和布尔两种语义
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Text(String),
}

impl FieldValue {
    /// 文本形式（布尔值写成 "true" / "false"）
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Bool(b) => b.to_string(),
        }
    }

    /// JS 语义的真值判断：非空字符串或 true
    pub fn truthy(&self) -> bool {
        match self {
            FieldValue::Text(s) => !s.is_empty(),
            FieldValue::Bool(b) => *b,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

/// 按逻辑字段名取值
pub trait FieldSource {
    fn field(&self, logical: &str) -> Option<FieldValue>;
}

fn text(v: &Option<String>) -> Option<FieldValue> {
    v.as_ref().map(|s| FieldValue::Text(s.clone()))
}

/// 候选人资料
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default)]
    pub experience: Vec<WorkEntry>,
    #[serde(default)]
    pub education: Vec<EduEntry>,
}

impl FieldSource for CandidateProfile {
    fn field(&self, logical: &str) -> Option<FieldValue> {
        match logical {
            "firstName" => text(&self.first_name),
            "lastName" => text(&self.last_name),
            "email" => text(&self.email),
            "phone" => text(&self.phone),
            "linkedin" => text(&self.linkedin),
            "website" => text(&self.website),
            "gender" => text(&self.gender),
            "city" => text(&self.city),
            _ => None,
        }
    }
}

/// 工作经历
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldSource for WorkEntry {
    fn field(&self, logical: &str) -> Option<FieldValue> {
        match logical {
            "company" => text(&self.company),
            "title" => text(&self.title),
            "startDate" => text(&self.start_date),
            "endDate" => text(&self.end_date),
            "current" => self.current.map(FieldValue::Bool),
            "description" => text(&self.description),
            _ => None,
        }
    }
}

/// 教育经历
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EduEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degree: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discipline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
}

impl FieldSource for EduEntry {
    fn field(&self, logical: &str) -> Option<FieldValue> {
        match logical {
            "school" => text(&self.school),
            "degree" => text(&self.degree),
            "discipline" => text(&self.discipline),
            "startDate" => text(&self.start_date),
            _ => None,
        }
    }
}

/// candidate.json 的外层结构 `{ "candidate": {...} }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationDetails {
    pub candidate: CandidateProfile,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_from_camel_case_json() {
        let json = r#"{
            "firstName": "Ada",
            "email": "ada@x.com",
            "experience": [{"company": "Analytical Engines", "current": true}],
            "education": [{"school": "Home", "startDate": "1830"}]
        }"#;
        let profile: CandidateProfile = serde_json::from_str(json).unwrap();

        assert_eq!(profile.field("firstName"), Some(FieldValue::from("Ada")));
        assert_eq!(profile.field("lastName"), None);
        assert_eq!(profile.experience[0].field("current"), Some(FieldValue::Bool(true)));
        assert_eq!(profile.education[0].field("startDate"), Some(FieldValue::from("1830")));
        assert_eq!(profile.field("unknown"), None);
    }

    #[test]
    fn test_missing_sequences_default_to_empty() {
        let profile: CandidateProfile = serde_json::from_str(r#"{"firstName":"Ada"}"#).unwrap();
        assert!(profile.experience.is_empty());
        assert!(profile.education.is_empty());
    }

    #[test]
    fn test_field_value_truthiness() {
        assert!(FieldValue::from("x").truthy());
        assert!(!FieldValue::from("").truthy());
        // 与 JS 一致："false" 字符串也是真值
        assert!(FieldValue::from("false").truthy());
        assert!(!FieldValue::Bool(false).truthy());
        assert_eq!(FieldValue::Bool(true).as_text(), "true");
    }
}
