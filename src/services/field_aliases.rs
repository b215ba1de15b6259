//! 字段别名表
//!
//! 逻辑字段名 → 页面上可能出现的控件标识（按优先级排列）。
//! 两层顺序都有意义：字段按声明顺序填写，别名按声明顺序尝试，第一个命中即停止

/// 一张别名表
#[derive(Debug, Clone, Copy)]
pub struct FieldAliasTable {
    entries: &'static [(&'static str, &'static [&'static str])],
}

impl FieldAliasTable {
    pub const fn new(entries: &'static [(&'static str, &'static [&'static str])]) -> Self {
        Self { entries }
    }

    /// 按声明顺序遍历 (逻辑字段, 别名列表)
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'static [&'static str])> + '_ {
        self.entries.iter().copied()
    }

    pub fn aliases(&self, logical: &str) -> Option<&'static [&'static str]> {
        self.entries
            .iter()
            .find(|(name, _)| *name == logical)
            .map(|(_, aliases)| *aliases)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 基本信息
pub const BASIC_INFO_ALIASES: FieldAliasTable = FieldAliasTable::new(&[
    ("firstName", &["first_name", "firstName", "given-name", "first-name"]),
    ("lastName", &["last_name", "lastName", "family-name", "last-name"]),
    ("email", &["email", "email_address", "emailAddress"]),
    ("phone", &["phone", "phone_number", "phoneNumber", "mobile_phone"]),
    ("linkedin", &["linkedin", "linkedinUrl", "linkedin_url"]),
    ("website", &["website", "personal_website", "portfolio"]),
    ("gender", &["gender"]),
    ("city", &["city", "candidate_location"]),
]);

/// 工作经历条目
pub const EXPERIENCE_ALIASES: FieldAliasTable = FieldAliasTable::new(&[
    ("company", &["company", "employer", "organization", "company_name"]),
    ("title", &["title", "job_title", "position", "role"]),
    ("startDate", &["start_date", "startDate", "employment_period_start"]),
    ("endDate", &["end_date", "endDate", "employment_period_end"]),
    ("current", &["current_position", "currently_employed", "current_job"]),
    ("description", &["description", "job_description", "responsibilities"]),
]);

/// 教育经历条目
pub const EDUCATION_ALIASES: FieldAliasTable = FieldAliasTable::new(&[
    ("school", &["school", "university", "institution", "school_name"]),
    ("degree", &["degree", "degree_type", "qualification"]),
    (
        "discipline",
        &["discipline", "field", "major", "field_of_study", "concentration"],
    ),
    ("startDate", &["start-year", "start_date_year", "start_date", "from_date"]),
]);

/// 重复条目的别名：先尝试全部 `别名--{index}`，再尝试原始别名
pub fn indexed_aliases(aliases: &[&str], index: usize) -> Vec<String> {
    aliases
        .iter()
        .map(|alias| format!("{}--{}", alias, index))
        .chain(aliases.iter().map(|alias| alias.to_string()))
        .collect()
}

/// 不带序号的别名列表
pub fn plain_aliases(aliases: &[&str]) -> Vec<String> {
    aliases.iter().map(|alias| alias.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_info_order_is_declaration_order() {
        let fields: Vec<_> = BASIC_INFO_ALIASES.iter().map(|(name, _)| name).collect();
        assert_eq!(
            fields,
            ["firstName", "lastName", "email", "phone", "linkedin", "website", "gender", "city"]
        );
    }

    #[test]
    fn test_indexed_aliases_put_suffixed_forms_first() {
        let aliases = indexed_aliases(&["school", "university"], 2);
        assert_eq!(aliases, ["school--2", "university--2", "school", "university"]);
    }

    #[test]
    fn test_alias_lookup() {
        assert_eq!(
            EXPERIENCE_ALIASES.aliases("current"),
            Some(&["current_position", "currently_employed", "current_job"][..])
        );
        assert!(EDUCATION_ALIASES.aliases("company").is_none());
        assert_eq!(EDUCATION_ALIASES.len(), 4);
    }
}
