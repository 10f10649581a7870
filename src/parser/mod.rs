pub mod elements;
pub mod sections;

use crate::model::Subsections;
use elements::{ClassifyRules, ElementSnapshot};

/// Two-pass pipeline: element snapshots → blocks → subsections.
pub fn classify_elements(elements: &[ElementSnapshot], rules: &ClassifyRules) -> Subsections {
    let blocks: Vec<_> = elements
        .iter()
        .map(|el| elements::classify_element(el, rules))
        .collect();
    sections::cluster_subsections(&blocks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(fixture: &str) -> Vec<ElementSnapshot> {
        let json = std::fs::read_to_string(format!("tests/fixtures/{}.json", fixture)).unwrap();
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn asthma_symptoms_page() {
        let subs = classify_elements(&load("asthma_symptoms"), &ClassifyRules::default());
        let keys: Vec<_> = subs.keys().map(String::as_str).collect();
        assert_eq!(keys, ["Overview", "Symptoms", "When to see a doctor", "Causes"]);
        assert_eq!(
            subs["Symptoms"],
            "Asthma symptoms vary from person to person.\n- Shortness of breath\n- Chest tightness or pain\n- Wheezing when exhaling"
        );
        assert_eq!(subs["Causes"], "It isn't clear why some people get asthma and others don't.");
    }

    #[test]
    fn nested_copy_and_references_excluded() {
        let subs = classify_elements(&load("asthma_symptoms"), &ClassifyRules::default());
        assert!(subs.values().all(|body| !body.contains("Related content")));
        assert!(subs.values().all(|body| !body.contains("Global Initiative for Asthma")));
        assert!(!subs.contains_key("References"));
    }

    #[test]
    fn idempotent() {
        let elements = load("asthma_symptoms");
        let rules = ClassifyRules::default();
        assert_eq!(classify_elements(&elements, &rules), classify_elements(&elements, &rules));
    }
}
