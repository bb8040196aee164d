use shared_models::Practitioner;

/// How a patient picked a practitioner from a numbered list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PractitionerChoice {
    /// 1-based position in the list shown to the patient.
    ByIndex(usize),
    /// Case-insensitive fragment of the practitioner's name.
    ByNameMatch(String),
}

impl PractitionerChoice {
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }

        match trimmed.parse::<usize>() {
            Ok(index) => Some(PractitionerChoice::ByIndex(index)),
            Err(_) => Some(PractitionerChoice::ByNameMatch(trimmed.to_lowercase())),
        }
    }

    pub fn resolve<'a>(&self, candidates: &'a [Practitioner]) -> Option<&'a Practitioner> {
        match self {
            PractitionerChoice::ByIndex(index) => {
                index.checked_sub(1).and_then(|position| candidates.get(position))
            }
            PractitionerChoice::ByNameMatch(fragment) => candidates
                .iter()
                .find(|candidate| candidate.name.to_lowercase().contains(fragment.as_str())),
        }
    }
}
