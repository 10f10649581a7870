use regex::Regex;

use crate::config::CrawlConfig;

/// Index letters, `A` through `Z` inclusive.
pub fn letters() -> impl Iterator<Item = char> {
    'A'..='Z'
}

/// URL of one letter's page in the alphabetical index.
pub fn letter_url(root: &str, letter: char) -> String {
    format!("{}?letter={}", root, letter)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlVerdict {
    Accept,
    /// Not under the disease-content path.
    OutsideContent,
    /// Disease content, but neither of the expected page kinds.
    WrongSubtype,
}

/// Compiled URL acceptance patterns.
#[derive(Debug, Clone)]
pub struct UrlFilter {
    content: Regex,
    subtypes: Vec<Regex>,
}

impl UrlFilter {
    pub fn new(content: &str, subtypes: &[String]) -> Result<Self, regex::Error> {
        Ok(Self {
            content: Regex::new(content)?,
            subtypes: subtypes
                .iter()
                .map(|p| Regex::new(p))
                .collect::<Result<_, _>>()?,
        })
    }

    pub fn from_config(config: &CrawlConfig) -> Result<Self, regex::Error> {
        Self::new(&config.content_pattern, &config.subtype_patterns)
    }

    pub fn check(&self, url: &str) -> UrlVerdict {
        if !self.content.is_match(url) {
            UrlVerdict::OutsideContent
        } else if !self.subtypes.iter().any(|re| re.is_match(url)) {
            UrlVerdict::WrongSubtype
        } else {
            UrlVerdict::Accept
        }
    }
}

/// Normalize a tab label: decode `&amp;` and make sure every `&` is followed by a space.
pub fn normalize_label(label: &str) -> String {
    let decoded = label.replace("&amp;", "&");
    let mut out = String::with_capacity(decoded.len() + 2);
    let mut chars = decoded.trim().chars().peekable();
    while let Some(c) = chars.next() {
        out.push(c);
        if c == '&' && chars.peek().is_some_and(|n| !n.is_whitespace()) {
            out.push(' ');
        }
    }
    out
}

/// True when the label contains any of the filter terms (case-sensitive).
pub fn matches_section(label: &str, filter: &[String]) -> bool {
    filter.iter().any(|term| label.contains(term.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_filter() -> UrlFilter {
        UrlFilter::from_config(&CrawlConfig::default()).unwrap()
    }

    #[test]
    fn twenty_six_letters() {
        let all: String = letters().collect();
        assert_eq!(all.len(), 26);
        assert_eq!(all.chars().next(), Some('A'));
        assert_eq!(all.chars().last(), Some('Z'));
    }

    #[test]
    fn letter_query() {
        assert_eq!(
            letter_url("https://www.mayoclinic.org/diseases-conditions/index", 'Q'),
            "https://www.mayoclinic.org/diseases-conditions/index?letter=Q"
        );
    }

    #[test]
    fn accepts_symptoms_and_diagnosis_pages() {
        let f = default_filter();
        assert_eq!(
            f.check("https://www.mayoclinic.org/diseases-conditions/asthma/symptoms-causes/syc-20369653"),
            UrlVerdict::Accept
        );
        assert_eq!(
            f.check("https://www.mayoclinic.org/diseases-conditions/gout/diagnosis-treatment/drc-20372903"),
            UrlVerdict::Accept
        );
    }

    #[test]
    fn rejects_other_domains() {
        let f = default_filter();
        assert_eq!(
            f.check("https://www.mayoclinic.org/tests-procedures/mri/about/pac-20384768"),
            UrlVerdict::OutsideContent
        );
        assert_eq!(
            f.check("https://example.com/diseases-conditions/asthma/symptoms-causes/x"),
            UrlVerdict::OutsideContent
        );
    }

    #[test]
    fn rejects_other_subtypes() {
        let f = default_filter();
        assert_eq!(
            f.check("https://www.mayoclinic.org/diseases-conditions/asthma/doctors-departments/ddc-20369660"),
            UrlVerdict::WrongSubtype
        );
    }

    #[test]
    fn label_ampersand_spacing() {
        assert_eq!(normalize_label("Symptoms &causes"), "Symptoms & causes");
        assert_eq!(normalize_label("Symptoms & causes"), "Symptoms & causes");
        assert_eq!(normalize_label(" Diagnosis &amp;treatment "), "Diagnosis & treatment");
        assert_eq!(normalize_label("Overview"), "Overview");
    }

    #[test]
    fn section_filter_is_case_sensitive() {
        let filter = vec!["Symptoms".to_string(), "Diagnosis".to_string()];
        assert!(matches_section("Symptoms & causes", &filter));
        assert!(matches_section("Diagnosis & treatment", &filter));
        assert!(!matches_section("symptoms & causes", &filter));
        assert!(!matches_section("Doctors & departments", &filter));
    }
}
